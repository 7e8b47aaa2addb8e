use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::scoring::{DayNumber, DayRef, ScoreEvent, ScoringAction, ScoringError};

/// A `score_events` row joined with the day number of its day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreEventRow {
    pub id: i32,
    pub user_id: Uuid,
    pub day_id: Option<i32>,
    pub day_number: Option<i32>,
    pub action: String,
    pub award_key: String,
    pub points: i32,
    pub reason: String,
    pub earned_at: DateTime<Utc>,
}

impl ScoreEventRow {
    /// Unknown actions and out-of-range day numbers are rejected, never defaulted.
    pub fn into_event(self) -> Result<ScoreEvent, ScoringError> {
        let action: ScoringAction = self.action.parse()?;
        let day = match (self.day_id, self.day_number) {
            (Some(id), Some(n)) => Some(DayRef {
                id,
                day_number: DayNumber::new(n)?,
            }),
            _ => None,
        };
        Ok(ScoreEvent {
            id: self.id,
            points: self.points,
            reason: self.reason,
            action,
            earned_at: self.earned_at,
            day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action: &str, day_number: Option<i32>) -> ScoreEventRow {
        ScoreEventRow {
            id: 3,
            user_id: Uuid::new_v4(),
            day_id: day_number.map(|_| 11),
            day_number,
            action: action.to_string(),
            award_key: "open-day:5".to_string(),
            points: 25,
            reason: "opening the day's cell".to_string(),
            earned_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_event() {
        let event = row("open-day", Some(5)).into_event().unwrap();
        assert_eq!(event.action, ScoringAction::OpenDay);
        assert_eq!(event.day.unwrap().id, 11);
        assert_eq!(event.day.unwrap().day_number.get(), 5);
    }

    #[test]
    fn test_unknown_action_fails_fast() {
        let err = row("mystery", Some(5)).into_event().unwrap_err();
        assert_eq!(err, ScoringError::InvalidAction("mystery".to_string()));
    }

    #[test]
    fn test_missing_day_is_kept_as_none() {
        let event = row("first-connection", None).into_event().unwrap();
        assert!(event.day.is_none());
    }
}
