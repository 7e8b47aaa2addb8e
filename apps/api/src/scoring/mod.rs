//! Scoring engine: pure, synchronous pricing and aggregation.
//!
//! Nothing in here touches the database or the clock. Callers pass the
//! calendar date and offset explicitly.

pub mod error;
pub mod history;
pub mod reward;
pub mod rules;

pub use error::ScoringError;
pub use history::{partition_by_timeliness, DatedScores, DayRef, ScoreEvent, ScoreHistory};
pub use reward::RewardProgress;
pub use rules::{price, DayNumber, ScoringAction, Timeliness};
