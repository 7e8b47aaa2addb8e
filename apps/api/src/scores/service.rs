//! Award flows: glue between the pure scoring engine and the ledger.
//!
//! Every call takes an explicit `UserContext` and the calendar instant; no
//! ambient user or clock is read here.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::content::kind::{AnswerCheck, ContentKind};
use crate::errors::AppError;
use crate::models::calendar::ContentRow;
use crate::scores::ledger::{Appended, CappedAward, FirstAttempt, NewAward, ScoreLedger};
use crate::scoring::{
    partition_by_timeliness, price, DatedScores, DayRef, RewardProgress, ScoreEvent,
    ScoreHistory, ScoringAction, Timeliness,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
}

/// The calendar instant an action happens at.
#[derive(Debug, Clone, Copy)]
pub struct ActionTime {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AwardOutcome {
    Awarded { event: ScoreEvent },
    /// Permitted but worth nothing (late cell opening, wrong answer).
    Unrewarded,
    AlreadyOpened,
    /// The game was already answered once; the answer is not checked again.
    AlreadyAnswered,
    AlreadyAwarded,
    CapReached,
}

impl AwardOutcome {
    pub fn points(&self) -> i32 {
        match self {
            AwardOutcome::Awarded { event } => event.points,
            _ => 0,
        }
    }
}

fn award_key(action: ScoringAction, subject: i32) -> String {
    format!("{}:{}", action.as_str(), subject)
}

/// Builds the capped award for an action, or `None` when it is worth nothing.
fn capped_award(
    user: UserContext,
    day: DayRef,
    action: ScoringAction,
    timeliness: Timeliness,
    award_key: String,
    now: DateTime<Utc>,
) -> Option<CappedAward> {
    let points = price(action, timeliness);
    let cap = action.daily_cap()?;
    (points > 0).then(|| CappedAward {
        award: NewAward {
            user_id: user.user_id,
            day: Some(day),
            action,
            award_key,
            points: points as i32,
            reason: action.reason().to_string(),
            earned_at: now,
        },
        day,
        cap,
    })
}

fn outcome_of(user: UserContext, day: DayRef, appended: Option<Appended>) -> AwardOutcome {
    match appended {
        Some(Appended::Recorded(event)) => AwardOutcome::Awarded { event },
        Some(Appended::Duplicate) => AwardOutcome::AlreadyAwarded,
        Some(Appended::CapReached) => {
            warn!(
                "User {} reached a daily cap for day {}",
                user.user_id, day.day_number
            );
            AwardOutcome::CapReached
        }
        None => AwardOutcome::Unrewarded,
    }
}

/// Registers the user and grants the one-time connection bonus.
pub async fn connect_user(
    ledger: &dyn ScoreLedger,
    user: UserContext,
    now: DateTime<Utc>,
) -> Result<AwardOutcome, AppError> {
    ledger.register_user(user.user_id).await?;

    let action = ScoringAction::FirstConnection;
    let appended = ledger
        .append(NewAward {
            user_id: user.user_id,
            day: None,
            action,
            award_key: action.as_str().to_string(),
            points: price(action, Timeliness::OnTime) as i32,
            reason: action.reason().to_string(),
            earned_at: now,
        })
        .await?;

    Ok(match appended {
        Some(event) => {
            info!("First connection bonus granted to {}", user.user_id);
            AwardOutcome::Awarded { event }
        }
        None => AwardOutcome::AlreadyAwarded,
    })
}

/// Opens a cell. Locked cells are rejected before anything is recorded;
/// late openings are recorded but unrewarded. The opening and its award are
/// stored together.
pub async fn open_day(
    ledger: &dyn ScoreLedger,
    user: UserContext,
    day: DayRef,
    at: ActionTime,
) -> Result<AwardOutcome, AppError> {
    let timeliness = Timeliness::evaluate(day.day_number, at.today)?;

    let action = ScoringAction::OpenDay;
    let award = capped_award(
        user,
        day,
        action,
        timeliness,
        award_key(action, i32::from(day.day_number.get())),
        at.now,
    );

    match ledger.open_day(user.user_id, day.id, award).await? {
        FirstAttempt::Repeated => Ok(AwardOutcome::AlreadyOpened),
        FirstAttempt::First(appended) => {
            let outcome = outcome_of(user, day, appended);
            info!(
                "User {} opened day {} ({:?}, {} points)",
                user.user_id,
                day.day_number,
                timeliness,
                outcome.points()
            );
            Ok(outcome)
        }
    }
}

pub async fn discover_content(
    ledger: &dyn ScoreLedger,
    user: UserContext,
    day: DayRef,
    content_id: i32,
    at: ActionTime,
) -> Result<AwardOutcome, AppError> {
    let timeliness = Timeliness::evaluate(day.day_number, at.today)?;
    let action = ScoringAction::DiscoverContent;
    let appended = match capped_award(
        user,
        day,
        action,
        timeliness,
        award_key(action, content_id),
        at.now,
    ) {
        Some(award) => Some(ledger.append_capped(award).await?),
        None => None,
    };
    Ok(outcome_of(user, day, appended))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    #[serde(flatten)]
    pub check: AnswerCheck,
    #[serde(flatten)]
    pub outcome: AwardOutcome,
}

/// Checks an answer to a game and rewards it when correct. Only the first
/// answer of a user to a game counts.
pub async fn answer_game(
    ledger: &dyn ScoreLedger,
    user: UserContext,
    day: DayRef,
    content: &ContentRow,
    answer: &str,
    at: ActionTime,
) -> Result<AnswerResult, AppError> {
    let timeliness = Timeliness::evaluate(day.day_number, at.today)?;

    let kind = ContentKind::try_from(content)?;
    let game = kind
        .as_game()
        .ok_or_else(|| AppError::Validation(format!("Content {} is not a game", content.id)))?;
    let check = game.check_answer(answer).ok_or_else(|| {
        AppError::Validation(format!("Game {} has no answer to check", content.id))
    })?;

    let action = ScoringAction::AnswerGameCorrectly;
    let award = if check.correct {
        capped_award(
            user,
            day,
            action,
            timeliness,
            award_key(action, content.id),
            at.now,
        )
    } else {
        None
    };

    let outcome = match ledger
        .record_answer(user.user_id, content.id, check.correct, award)
        .await?
    {
        FirstAttempt::Repeated => AwardOutcome::AlreadyAnswered,
        FirstAttempt::First(appended) => outcome_of(user, day, appended),
    };

    Ok(AnswerResult { check, outcome })
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub score: i64,
    pub reward: RewardProgress,
    pub scores_by_date: Vec<DatedScores>,
}

/// Total, reward progress and history partitioned by timeliness.
pub async fn score_summary(
    ledger: &dyn ScoreLedger,
    user: UserContext,
    offset: FixedOffset,
    reward_threshold: i64,
    today: NaiveDate,
) -> Result<ScoreSummary, AppError> {
    let events = ledger.events_for_user(user.user_id).await?;
    let history = ScoreHistory::from_events(events, offset);
    let score = history.total_points();
    let scores_by_date = partition_by_timeliness(&history, offset)?;

    Ok(ScoreSummary {
        score,
        reward: RewardProgress::evaluate(score, reward_threshold, today),
        scores_by_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::memory::MemoryLedger;
    use crate::scoring::{DayNumber, ScoringError};
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at_december(day: u32) -> ActionTime {
        let now = Utc.with_ymd_and_hms(2024, 12, day, 10, 0, 0).unwrap();
        ActionTime {
            now,
            today: now.date_naive(),
        }
    }

    fn day(n: i32) -> DayRef {
        DayRef {
            id: 100 + n,
            day_number: DayNumber::new(n).unwrap(),
        }
    }

    fn user() -> UserContext {
        UserContext {
            user_id: Uuid::new_v4(),
        }
    }

    fn game(id: i32, answer: &str) -> ContentRow {
        ContentRow {
            id,
            day_id: 105,
            content_type: "game".to_string(),
            title: "Quiz".to_string(),
            content1: Some("Question?".to_string()),
            content2: None,
            content3: Some(answer.to_string()),
            content4: Some("Because.".to_string()),
            content5: Some("quiz-noel".to_string()),
        }
    }

    #[tokio::test]
    async fn test_open_day_on_time_awards_25() {
        let ledger = MemoryLedger::default();
        let outcome = open_day(&ledger, user(), day(5), at_december(5)).await.unwrap();
        assert_eq!(outcome.points(), 25);
    }

    #[tokio::test]
    async fn test_open_day_late_is_permitted_but_unrewarded() {
        let ledger = MemoryLedger::default();
        let u = user();
        let outcome = open_day(&ledger, u, day(5), at_december(9)).await.unwrap();
        assert_eq!(outcome, AwardOutcome::Unrewarded);
        assert!(ledger.is_day_open(u.user_id, day(5).id).await.unwrap());
        assert!(ledger.events_for_user(u.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_locked_day_is_rejected_without_side_effects() {
        let ledger = MemoryLedger::default();
        let u = user();
        let err = open_day(&ledger, u, day(12), at_december(3)).await.unwrap_err();
        assert!(matches!(err, AppError::NotYetAvailable(_)));
        assert!(!ledger.is_day_open(u.user_id, day(12).id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reopening_does_not_double_award() {
        let ledger = MemoryLedger::default();
        let u = user();
        open_day(&ledger, u, day(5), at_december(5)).await.unwrap();
        let again = open_day(&ledger, u, day(5), at_december(5)).await.unwrap();
        assert_eq!(again, AwardOutcome::AlreadyOpened);
        assert_eq!(ledger.events_for_user(u.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_five_discoveries_on_time_then_cap() {
        let ledger = MemoryLedger::default();
        let u = user();
        let mut total = 0;
        for content_id in 1..=5 {
            let o = discover_content(&ledger, u, day(5), content_id, at_december(5))
                .await
                .unwrap();
            total += o.points();
        }
        assert_eq!(total, 60);

        let sixth = discover_content(&ledger, u, day(5), 6, at_december(5))
            .await
            .unwrap();
        assert_eq!(sixth, AwardOutcome::CapReached);
    }

    #[tokio::test]
    async fn test_five_discoveries_late_give_30() {
        let ledger = MemoryLedger::default();
        let u = user();
        let mut total = 0;
        for content_id in 1..=5 {
            total += discover_content(&ledger, u, day(5), content_id, at_december(8))
                .await
                .unwrap()
                .points();
        }
        assert_eq!(total, 30);
    }

    #[tokio::test]
    async fn test_same_content_discovered_twice() {
        let ledger = MemoryLedger::default();
        let u = user();
        discover_content(&ledger, u, day(5), 1, at_december(5)).await.unwrap();
        let again = discover_content(&ledger, u, day(5), 1, at_december(5))
            .await
            .unwrap();
        assert_eq!(again, AwardOutcome::AlreadyAwarded);
    }

    #[tokio::test]
    async fn test_correct_answer_awards_and_wrong_does_not() {
        let ledger = MemoryLedger::default();
        let u = user();
        let wrong = answer_game(&ledger, u, day(5), &game(1, "Rudolph"), "Comet", at_december(5))
            .await
            .unwrap();
        assert!(!wrong.check.correct);
        assert_eq!(wrong.outcome, AwardOutcome::Unrewarded);

        let right = answer_game(&ledger, u, day(5), &game(2, "Rudolph"), "Rudolph", at_december(7))
            .await
            .unwrap();
        assert!(right.check.correct);
        assert_eq!(right.outcome.points(), 6);
    }

    #[tokio::test]
    async fn test_answers_capped_at_three_per_day() {
        let ledger = MemoryLedger::default();
        let u = user();
        for id in 1..=3 {
            let r = answer_game(&ledger, u, day(5), &game(id, "A"), "A", at_december(5))
                .await
                .unwrap();
            assert_eq!(r.outcome.points(), 12);
        }
        let fourth = answer_game(&ledger, u, day(5), &game(4, "A"), "A", at_december(5))
            .await
            .unwrap();
        assert_eq!(fourth.outcome, AwardOutcome::CapReached);
    }

    #[tokio::test]
    async fn test_revealed_answer_cannot_be_resubmitted() {
        let ledger = MemoryLedger::default();
        let u = user();
        let quiz = game(1, "B");
        let wrong = answer_game(&ledger, u, day(5), &quiz, "A", at_december(5))
            .await
            .unwrap();
        assert!(!wrong.check.correct);
        assert_eq!(wrong.outcome, AwardOutcome::Unrewarded);

        let retry = answer_game(&ledger, u, day(5), &quiz, &wrong.check.expected, at_december(5))
            .await
            .unwrap();
        assert_eq!(retry.outcome, AwardOutcome::AlreadyAnswered);
        assert!(ledger.events_for_user(u.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_correct_answer_counts_once() {
        let ledger = MemoryLedger::default();
        let u = user();
        let quiz = game(1, "B");
        let first = answer_game(&ledger, u, day(5), &quiz, "B", at_december(5))
            .await
            .unwrap();
        assert_eq!(first.outcome.points(), 12);
        let second = answer_game(&ledger, u, day(5), &quiz, "B", at_december(5))
            .await
            .unwrap();
        assert_eq!(second.outcome, AwardOutcome::AlreadyAnswered);
        assert_eq!(ledger.events_for_user(u.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_discoveries_respect_the_cap() {
        let ledger = std::sync::Arc::new(MemoryLedger::default());
        let u = user();

        let tasks: Vec<_> = (1..=12)
            .map(|content_id| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    discover_content(ledger.as_ref(), u, day(5), content_id, at_december(5)).await
                })
            })
            .collect();

        let mut capped = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == AwardOutcome::CapReached {
                capped += 1;
            }
        }

        let events = ledger.events_for_user(u.user_id).await.unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events.iter().map(|e| e.points).sum::<i32>(), 60);
        assert_eq!(capped, 7);
    }

    #[tokio::test]
    async fn test_failed_award_does_not_record_the_opening() {
        let ledger = MemoryLedger::default();
        let u = user();
        ledger.fail_next_award();

        let err = open_day(&ledger, u, day(5), at_december(5)).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!ledger.is_day_open(u.user_id, day(5).id).await.unwrap());

        let retry = open_day(&ledger, u, day(5), at_december(5)).await.unwrap();
        assert_eq!(retry.points(), 25);
        assert!(ledger.is_day_open(u.user_id, day(5).id).await.unwrap());
        assert_eq!(ledger.events_for_user(u.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_answer_on_non_game_is_rejected() {
        let ledger = MemoryLedger::default();
        let mut quote = game(1, "A");
        quote.content_type = "quote".to_string();
        let err = answer_game(&ledger, user(), day(5), &quote, "A", at_december(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_connection_bonus_is_granted_once() {
        let ledger = MemoryLedger::default();
        let u = user();
        let first = connect_user(&ledger, u, at_december(1).now).await.unwrap();
        assert_eq!(first.points(), 40);
        let second = connect_user(&ledger, u, at_december(2).now).await.unwrap();
        assert_eq!(second, AwardOutcome::AlreadyAwarded);
    }

    #[tokio::test]
    async fn test_summary_groups_by_date_and_timeliness() {
        let ledger = MemoryLedger::default();
        let u = user();
        connect_user(&ledger, u, at_december(3).now).await.unwrap();
        open_day(&ledger, u, day(3), at_december(3)).await.unwrap();
        open_day(&ledger, u, day(2), at_december(3)).await.unwrap();
        discover_content(&ledger, u, day(2), 9, at_december(3)).await.unwrap();
        discover_content(&ledger, u, day(5), 10, at_december(5)).await.unwrap();

        let summary = score_summary(&ledger, u, utc(), 2512, at_december(5).today)
            .await
            .unwrap();
        assert_eq!(summary.score, 40 + 25 + 6 + 12);
        assert_eq!(summary.scores_by_date.len(), 2);

        let third = &summary.scores_by_date[0];
        assert_eq!(third.date, "2024-12-03");
        assert_eq!(third.buckets.on_time.len(), 2);
        assert_eq!(third.buckets.late.len(), 1);
        assert_eq!(summary.scores_by_date[1].date, "2024-12-05");
        assert!(!summary.reward.threshold_reached);
    }

    #[test]
    fn test_locked_day_reports_today() {
        assert_eq!(
            Timeliness::evaluate(DayNumber::new(20).unwrap(), at_december(1).today),
            Err(ScoringError::NotYetAvailable {
                day_number: 20,
                today_day: 1
            })
        );
    }
}
