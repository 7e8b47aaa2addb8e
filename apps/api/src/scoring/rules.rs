//! Point table and timing rules.
//!
//! Every rewarded action is priced here and nowhere else. Callers decide
//! *whether* an action qualifies (caps, duplicates); this module only says
//! what it is worth.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::scoring::error::ScoringError;

pub const CALENDAR_DAYS: u8 = 24;

pub const FIRST_CONNECTION_POINTS: u32 = 40;
pub const OPEN_DAY_ON_TIME_POINTS: u32 = 25;
pub const OPEN_DAY_LATE_POINTS: u32 = 0;
pub const DISCOVERY_ON_TIME_POINTS: u32 = 12;
pub const DISCOVERY_LATE_POINTS: u32 = 6;
pub const CORRECT_ANSWER_ON_TIME_POINTS: u32 = 12;
pub const CORRECT_ANSWER_LATE_POINTS: u32 = 6;

pub const MAX_DISCOVERIES_PER_DAY: u32 = 5;
pub const MAX_CORRECT_ANSWERS_PER_DAY: u32 = 3;

/// 25 + 5×12 + 3×12 = 121
pub const MAX_POINTS_PER_DAY: u32 = OPEN_DAY_ON_TIME_POINTS
    + MAX_DISCOVERIES_PER_DAY * DISCOVERY_ON_TIME_POINTS
    + MAX_CORRECT_ANSWERS_PER_DAY * CORRECT_ANSWER_ON_TIME_POINTS;

/// A calendar cell number, always within 1..=24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayNumber(u8);

impl DayNumber {
    pub fn new(n: i32) -> Result<Self, ScoringError> {
        if (1..=i32::from(CALENDAR_DAYS)).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(ScoringError::DayOutOfRange(n))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for DayNumber {
    type Error = ScoringError;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl fmt::Display for DayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeliness {
    OnTime,
    Late,
}

impl Timeliness {
    /// Compares today's day-of-month with the cell number.
    /// Equal is on-time, greater is late, smaller means the cell is still locked.
    pub fn evaluate(day: DayNumber, today: NaiveDate) -> Result<Self, ScoringError> {
        if !is_unlocked(day, today) {
            return Err(ScoringError::NotYetAvailable {
                day_number: day.get(),
                today_day: today.day(),
            });
        }
        Ok(if u32::from(day.get()) == today.day() {
            Timeliness::OnTime
        } else {
            Timeliness::Late
        })
    }

    #[cfg(test)]
    pub fn is_on_time(self) -> bool {
        matches!(self, Timeliness::OnTime)
    }
}

/// Whether the cell can be opened on `today`.
pub fn is_unlocked(day: DayNumber, today: NaiveDate) -> bool {
    u32::from(day.get()) <= today.day()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringAction {
    FirstConnection,
    OpenDay,
    DiscoverContent,
    AnswerGameCorrectly,
}

impl ScoringAction {
    pub const ALL: [ScoringAction; 4] = [
        ScoringAction::FirstConnection,
        ScoringAction::OpenDay,
        ScoringAction::DiscoverContent,
        ScoringAction::AnswerGameCorrectly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringAction::FirstConnection => "first-connection",
            ScoringAction::OpenDay => "open-day",
            ScoringAction::DiscoverContent => "discover-content",
            ScoringAction::AnswerGameCorrectly => "answer-game-correctly",
        }
    }

    /// Points for this action. The first-connection bonus is not tied to a
    /// day, so its price ignores timeliness.
    pub fn points(self, timeliness: Timeliness) -> u32 {
        use Timeliness::*;
        match (self, timeliness) {
            (ScoringAction::FirstConnection, _) => FIRST_CONNECTION_POINTS,
            (ScoringAction::OpenDay, OnTime) => OPEN_DAY_ON_TIME_POINTS,
            (ScoringAction::OpenDay, Late) => OPEN_DAY_LATE_POINTS,
            (ScoringAction::DiscoverContent, OnTime) => DISCOVERY_ON_TIME_POINTS,
            (ScoringAction::DiscoverContent, Late) => DISCOVERY_LATE_POINTS,
            (ScoringAction::AnswerGameCorrectly, OnTime) => CORRECT_ANSWER_ON_TIME_POINTS,
            (ScoringAction::AnswerGameCorrectly, Late) => CORRECT_ANSWER_LATE_POINTS,
        }
    }

    /// How many times the action can be rewarded for a single day.
    /// `None` for the one-time connection bonus, which belongs to no day.
    pub fn daily_cap(self) -> Option<u32> {
        match self {
            ScoringAction::FirstConnection => None,
            ScoringAction::OpenDay => Some(1),
            ScoringAction::DiscoverContent => Some(MAX_DISCOVERIES_PER_DAY),
            ScoringAction::AnswerGameCorrectly => Some(MAX_CORRECT_ANSWERS_PER_DAY),
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ScoringAction::FirstConnection => "first connection to the calendar",
            ScoringAction::OpenDay => "opening the day's cell",
            ScoringAction::DiscoverContent => "discovering a content",
            ScoringAction::AnswerGameCorrectly => "correct answer to a game",
        }
    }
}

impl fmt::Display for ScoringAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringAction {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoringAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ScoringError::InvalidAction(s.to_string()))
    }
}

/// Prices an action. Same inputs always give the same value.
pub fn price(action: ScoringAction, timeliness: Timeliness) -> u32 {
    action.points(timeliness)
}

/// One row of the published point table.
#[derive(Debug, Clone, Serialize)]
pub struct PointRule {
    pub action: ScoringAction,
    pub reason: &'static str,
    pub on_time: u32,
    pub late: u32,
    pub daily_cap: Option<u32>,
}

pub fn point_table() -> Vec<PointRule> {
    ScoringAction::ALL
        .into_iter()
        .map(|action| PointRule {
            action,
            reason: action.reason(),
            on_time: price(action, Timeliness::OnTime),
            late: price(action, Timeliness::Late),
            daily_cap: action.daily_cap(),
        })
        .collect()
}
