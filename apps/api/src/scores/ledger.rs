//! Score ledger — append-only storage of score events, day openings and
//! answer attempts.
//!
//! `AppState` holds an `Arc<dyn ScoreLedger>`. Every write that can race is
//! a single ledger call: the Postgres implementation runs it in one
//! transaction under an advisory lock on (user, day), so daily caps and
//! "first time only" rules hold across concurrent requests. An award key can
//! only be recorded once per user, so a double tap never double-awards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::score::ScoreEventRow;
use crate::scoring::{DayRef, ScoreEvent, ScoringAction};

/// A score event about to be written.
#[derive(Debug, Clone)]
pub struct NewAward {
    pub user_id: Uuid,
    pub day: Option<DayRef>,
    pub action: ScoringAction,
    /// Uniqueness key per user, e.g. `open-day:5` or `discover-content:17`.
    pub award_key: String,
    pub points: i32,
    pub reason: String,
    pub earned_at: DateTime<Utc>,
}

impl NewAward {
    pub fn into_event(self, id: i32) -> ScoreEvent {
        ScoreEvent {
            id,
            points: self.points,
            reason: self.reason,
            action: self.action,
            earned_at: self.earned_at,
            day: self.day,
        }
    }
}

/// An award tied to a day, limited to `cap` events per user, day and action.
#[derive(Debug, Clone)]
pub struct CappedAward {
    pub award: NewAward,
    pub day: DayRef,
    pub cap: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Appended {
    Recorded(ScoreEvent),
    /// The award key was already used by this user.
    Duplicate,
    CapReached,
}

/// Result of an action a user can only perform once (opening a cell,
/// answering a game).
#[derive(Debug, Clone, PartialEq)]
pub enum FirstAttempt {
    /// Recorded now; carries the award result when there was one to give.
    First(Option<Appended>),
    Repeated,
}

#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Returns `true` the first time a user is seen.
    async fn register_user(&self, user_id: Uuid) -> Result<bool, AppError>;

    async fn is_day_open(&self, user_id: Uuid, day_id: i32) -> Result<bool, AppError>;

    /// Appends an uncapped award, or returns `None` if its key was already used.
    async fn append(&self, award: NewAward) -> Result<Option<ScoreEvent>, AppError>;

    /// Appends the award unless its key is used or the daily cap is reached.
    /// Counting and inserting are one atomic step.
    async fn append_capped(&self, award: CappedAward) -> Result<Appended, AppError>;

    /// Records the opening of a cell together with its award. Either both
    /// are stored or neither is.
    async fn open_day(
        &self,
        user_id: Uuid,
        day_id: i32,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError>;

    /// Records the first answer of a user to a game, right or wrong, together
    /// with its award. Later answers to the same game are refused.
    async fn record_answer(
        &self,
        user_id: Uuid,
        content_id: i32,
        correct: bool,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError>;

    /// All events of a user in `earned_at` order.
    async fn events_for_user(&self, user_id: Uuid) -> Result<Vec<ScoreEvent>, AppError>;
}

pub struct PgScoreLedger {
    pool: PgPool,
}

impl PgScoreLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serializes capped writes of one user on one day until the transaction ends.
async fn lock_user_day(
    conn: &mut PgConnection,
    user_id: Uuid,
    day_id: i32,
) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), $2)")
        .bind(user_id.to_string())
        .bind(day_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_award(
    conn: &mut PgConnection,
    award: NewAward,
) -> Result<Option<ScoreEvent>, AppError> {
    // Append-only: INSERT, never UPDATE. A used award key yields no row.
    let id: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO score_events
            (user_id, day_id, action, award_key, points, reason, earned_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, award_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(award.user_id)
    .bind(award.day.map(|d| d.id))
    .bind(award.action.as_str())
    .bind(&award.award_key)
    .bind(award.points)
    .bind(&award.reason)
    .bind(award.earned_at)
    .fetch_optional(conn)
    .await?;

    Ok(id.map(|id| {
        info!(
            "Recorded {} points for user {} ({})",
            award.points, award.user_id, award.award_key
        );
        award.into_event(id)
    }))
}

/// Must run inside a transaction holding `lock_user_day`.
async fn insert_capped(
    conn: &mut PgConnection,
    capped: CappedAward,
) -> Result<Appended, AppError> {
    let award = capped.award;

    let used: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM score_events WHERE user_id = $1 AND award_key = $2)",
    )
    .bind(award.user_id)
    .bind(&award.award_key)
    .fetch_one(&mut *conn)
    .await?;
    if used {
        return Ok(Appended::Duplicate);
    }

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM score_events WHERE user_id = $1 AND day_id = $2 AND action = $3",
    )
    .bind(award.user_id)
    .bind(capped.day.id)
    .bind(award.action.as_str())
    .fetch_one(&mut *conn)
    .await?;
    if count >= i64::from(capped.cap) {
        return Ok(Appended::CapReached);
    }

    Ok(match insert_award(conn, award).await? {
        Some(event) => Appended::Recorded(event),
        None => Appended::Duplicate,
    })
}

#[async_trait]
impl ScoreLedger for PgScoreLedger {
    async fn register_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        let created = result.rows_affected() == 1;
        if created {
            info!("Registered new user {user_id}");
        }
        Ok(created)
    }

    async fn is_day_open(&self, user_id: Uuid, day_id: i32) -> Result<bool, AppError> {
        let open: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM day_openings WHERE user_id = $1 AND day_id = $2)",
        )
        .bind(user_id)
        .bind(day_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(open)
    }

    async fn append(&self, award: NewAward) -> Result<Option<ScoreEvent>, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_award(&mut conn, award).await
    }

    async fn append_capped(&self, award: CappedAward) -> Result<Appended, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user_day(&mut tx, award.award.user_id, award.day.id).await?;
        let appended = insert_capped(&mut tx, award).await?;
        tx.commit().await?;
        Ok(appended)
    }

    async fn open_day(
        &self,
        user_id: Uuid,
        day_id: i32,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_user_day(&mut tx, user_id, day_id).await?;

        let opened = sqlx::query(
            "INSERT INTO day_openings (user_id, day_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(day_id)
        .execute(&mut *tx)
        .await?;
        if opened.rows_affected() == 0 {
            return Ok(FirstAttempt::Repeated);
        }

        let appended = match award {
            Some(award) => Some(insert_capped(&mut tx, award).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(FirstAttempt::First(appended))
    }

    async fn record_answer(
        &self,
        user_id: Uuid,
        content_id: i32,
        correct: bool,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError> {
        let mut tx = self.pool.begin().await?;
        if let Some(award) = &award {
            lock_user_day(&mut tx, user_id, award.day.id).await?;
        }

        let answered = sqlx::query(
            r#"
            INSERT INTO answer_attempts (user_id, content_id, correct)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(content_id)
        .bind(correct)
        .execute(&mut *tx)
        .await?;
        if answered.rows_affected() == 0 {
            return Ok(FirstAttempt::Repeated);
        }

        let appended = match award {
            Some(award) => Some(insert_capped(&mut tx, award).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(FirstAttempt::First(appended))
    }

    async fn events_for_user(&self, user_id: Uuid) -> Result<Vec<ScoreEvent>, AppError> {
        let rows = sqlx::query_as::<_, ScoreEventRow>(
            r#"
            SELECT s.id, s.user_id, s.day_id, d.day_number, s.action, s.award_key,
                   s.points, s.reason, s.earned_at
            FROM score_events s
            LEFT JOIN days d ON d.id = s.day_id
            WHERE s.user_id = $1
            ORDER BY s.earned_at ASC, s.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_event().map_err(AppError::from))
            .collect()
    }
}
