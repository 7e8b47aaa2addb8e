use thiserror::Error;

/// Errors raised by the pure scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Day {day_number} is not available yet (today is the {today_day})")]
    NotYetAvailable { day_number: u8, today_day: u32 },

    #[error("Day number {0} is outside the calendar (1-24)")]
    DayOutOfRange(i32),

    #[error("Score event {score_id} has no associated day")]
    MissingDay { score_id: i32 },

    #[error("Unknown scoring action: {0}")]
    InvalidAction(String),

    #[error("Unknown content kind: type={content_type:?}, sub-kind={sub_kind:?}")]
    InvalidContentKind {
        content_type: String,
        sub_kind: Option<String>,
    },
}
