//! Score history aggregation.
//!
//! Turns the per-date ledger view into display-ready buckets of events
//! earned on time and events earned late.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::scoring::error::ScoringError;
use crate::scoring::rules::{DayNumber, ScoringAction, Timeliness};

/// The day a score event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayRef {
    pub id: i32,
    pub day_number: DayNumber,
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEvent {
    pub id: i32,
    pub points: i32,
    pub reason: String,
    pub action: ScoringAction,
    pub earned_at: DateTime<Utc>,
    pub day: Option<DayRef>,
}

impl ScoreEvent {
    /// Calendar date the event was earned on, in the calendar's offset.
    pub fn calendar_date(&self, offset: FixedOffset) -> NaiveDate {
        self.earned_at.with_timezone(&offset).date_naive()
    }

    /// On-time iff the event was earned on the day-of-month of its day.
    /// The connection bonus belongs to no day and always counts as on-time;
    /// any other event without a day is a data-integrity fault.
    pub fn timeliness(&self, offset: FixedOffset) -> Result<Timeliness, ScoringError> {
        if self.action == ScoringAction::FirstConnection {
            return Ok(Timeliness::OnTime);
        }
        let day = self
            .day
            .ok_or(ScoringError::MissingDay { score_id: self.id })?;
        if self.calendar_date(offset).day() == u32::from(day.day_number.get()) {
            Ok(Timeliness::OnTime)
        } else {
            Ok(Timeliness::Late)
        }
    }
}

/// Ordered mapping of date key to the events earned that date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreHistory {
    dates: Vec<(String, Vec<ScoreEvent>)>,
}

impl ScoreHistory {
    #[cfg(test)]
    pub fn from_entries(dates: Vec<(String, Vec<ScoreEvent>)>) -> Self {
        Self { dates }
    }

    /// Groups events by `YYYY-MM-DD` calendar date. Keys keep the order in
    /// which they first appear, events keep their input order.
    pub fn from_events(events: impl IntoIterator<Item = ScoreEvent>, offset: FixedOffset) -> Self {
        let mut dates: Vec<(String, Vec<ScoreEvent>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for event in events {
            let key = event.calendar_date(offset).format("%Y-%m-%d").to_string();
            match index.get(&key) {
                Some(&i) => dates[i].1.push(event),
                None => {
                    index.insert(key.clone(), dates.len());
                    dates.push((key, vec![event]));
                }
            }
        }

        Self { dates }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[(String, Vec<ScoreEvent>)] {
        &self.dates
    }

    /// Raw accumulated total across every date.
    pub fn total_points(&self) -> i64 {
        self.dates
            .iter()
            .flat_map(|(_, events)| events.iter())
            .map(|e| i64::from(e.points))
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelinessBuckets {
    pub on_time: Vec<ScoreEvent>,
    pub late: Vec<ScoreEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedScores {
    pub date: String,
    #[serde(flatten)]
    pub buckets: TimelinessBuckets,
}

/// Stable partition of every date's events into on-time and late buckets.
/// Date order follows the history; dates without events are skipped.
pub fn partition_by_timeliness(
    history: &ScoreHistory,
    offset: FixedOffset,
) -> Result<Vec<DatedScores>, ScoringError> {
    let mut grouped = Vec::with_capacity(history.dates.len());

    for (date, events) in &history.dates {
        if events.is_empty() {
            continue;
        }
        let mut buckets = TimelinessBuckets::default();
        for event in events {
            match event.timeliness(offset)? {
                Timeliness::OnTime => buckets.on_time.push(event.clone()),
                Timeliness::Late => buckets.late.push(event.clone()),
            }
        }
        grouped.push(DatedScores {
            date: date.clone(),
            buckets,
        });
    }

    Ok(grouped)
}
