use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Source of "now" and "today" for the calendar.
///
/// Today is computed in a fixed UTC offset so every user sees the same
/// unlock boundary. Tests pin the instant with `CalendarClock::fixed`.
#[derive(Debug, Clone, Copy)]
pub struct CalendarClock {
    offset: FixedOffset,
    pinned: Option<DateTime<Utc>>,
}

impl CalendarClock {
    pub fn system(offset: FixedOffset) -> Self {
        Self {
            offset,
            pinned: None,
        }
    }

    #[cfg(test)]
    pub fn fixed(offset: FixedOffset, at: DateTime<Utc>) -> Self {
        Self {
            offset,
            pinned: Some(at),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.pinned.unwrap_or_else(Utc::now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }
}
