use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::scoring::rules::{CALENDAR_DAYS, FIRST_CONNECTION_POINTS, MAX_POINTS_PER_DAY};

/// Default business threshold for the December 25th surprise.
///
/// Configured independently of the point table: it does not equal
/// `theoretical_max_points()` and must not be derived from it.
pub const DEFAULT_REWARD_THRESHOLD: i64 = 2512;

/// Connection bonus plus every day fully completed on time (2944).
pub fn theoretical_max_points() -> i64 {
    i64::from(FIRST_CONNECTION_POINTS) + i64::from(CALENDAR_DAYS) * i64::from(MAX_POINTS_PER_DAY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardProgress {
    pub total: i64,
    pub threshold: i64,
    pub remaining: i64,
    pub threshold_reached: bool,
    /// The surprise is only revealed from December 25th onwards.
    pub reward_unlocked: bool,
}

impl RewardProgress {
    pub fn evaluate(total: i64, threshold: i64, today: NaiveDate) -> Self {
        let threshold_reached = total >= threshold;
        Self {
            total,
            threshold,
            remaining: (threshold - total).max(0),
            threshold_reached,
            reward_unlocked: threshold_reached && is_reward_day(today),
        }
    }
}

fn is_reward_day(today: NaiveDate) -> bool {
    today.month() == 12 && today.day() >= 25
}
