//! In-memory ledger used by service and router tests.
//!
//! Each call runs under one lock, so it has the same all-or-nothing
//! behavior as a Postgres transaction.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::scores::ledger::{Appended, CappedAward, FirstAttempt, NewAward, ScoreLedger};
use crate::scoring::ScoreEvent;

#[derive(Default)]
struct Inner {
    users: HashSet<Uuid>,
    openings: HashSet<(Uuid, i32)>,
    answers: HashSet<(Uuid, i32)>,
    events: Vec<(Uuid, String, ScoreEvent)>,
}

impl Inner {
    fn key_used(&self, user_id: Uuid, key: &str) -> bool {
        self.events
            .iter()
            .any(|(u, k, _)| *u == user_id && k == key)
    }

    fn push(&mut self, award: NewAward) -> ScoreEvent {
        let id = self.events.len() as i32 + 1;
        let user_id = award.user_id;
        let key = award.award_key.clone();
        let event = award.into_event(id);
        self.events.push((user_id, key, event.clone()));
        event
    }

    fn capped(&self, capped: &CappedAward) -> Option<Appended> {
        let award = &capped.award;
        if self.key_used(award.user_id, &award.award_key) {
            return Some(Appended::Duplicate);
        }
        let count = self
            .events
            .iter()
            .filter(|(u, _, e)| {
                *u == award.user_id
                    && e.action == award.action
                    && e.day.map(|d| d.id) == Some(capped.day.id)
            })
            .count();
        (count >= capped.cap as usize).then_some(Appended::CapReached)
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
    fail_next_award: AtomicBool,
}

impl MemoryLedger {
    /// Makes the next award write fail, as a dropped connection would.
    pub fn fail_next_award(&self) {
        self.fail_next_award.store(true, Ordering::SeqCst);
    }

    fn injected_failure(&self) -> Result<(), AppError> {
        if self.fail_next_award.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Stores the award if allowed; nothing is written on error.
    fn apply(
        &self,
        inner: &mut Inner,
        award: Option<CappedAward>,
    ) -> Result<Option<Appended>, AppError> {
        let Some(award) = award else {
            return Ok(None);
        };
        if let Some(refused) = inner.capped(&award) {
            return Ok(Some(refused));
        }
        self.injected_failure()?;
        Ok(Some(Appended::Recorded(inner.push(award.award))))
    }
}

#[async_trait]
impl ScoreLedger for MemoryLedger {
    async fn register_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.lock().unwrap().users.insert(user_id))
    }

    async fn is_day_open(&self, user_id: Uuid, day_id: i32) -> Result<bool, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .openings
            .contains(&(user_id, day_id)))
    }

    async fn append(&self, award: NewAward) -> Result<Option<ScoreEvent>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.key_used(award.user_id, &award.award_key) {
            return Ok(None);
        }
        self.injected_failure()?;
        Ok(Some(inner.push(award)))
    }

    async fn append_capped(&self, award: CappedAward) -> Result<Appended, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let appended = self.apply(&mut inner, Some(award))?;
        Ok(appended.unwrap_or(Appended::Duplicate))
    }

    async fn open_day(
        &self,
        user_id: Uuid,
        day_id: i32,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.openings.contains(&(user_id, day_id)) {
            return Ok(FirstAttempt::Repeated);
        }
        let appended = self.apply(&mut inner, award)?;
        inner.openings.insert((user_id, day_id));
        Ok(FirstAttempt::First(appended))
    }

    async fn record_answer(
        &self,
        user_id: Uuid,
        content_id: i32,
        _correct: bool,
        award: Option<CappedAward>,
    ) -> Result<FirstAttempt, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.answers.contains(&(user_id, content_id)) {
            return Ok(FirstAttempt::Repeated);
        }
        let appended = self.apply(&mut inner, award)?;
        inner.answers.insert((user_id, content_id));
        Ok(FirstAttempt::First(appended))
    }

    async fn events_for_user(&self, user_id: Uuid) -> Result<Vec<ScoreEvent>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut events: Vec<_> = inner
            .events
            .iter()
            .filter(|(u, _, _)| *u == user_id)
            .map(|(_, _, e)| e.clone())
            .collect();
        events.sort_by_key(|e| (e.earned_at, e.id));
        Ok(events)
    }
}
