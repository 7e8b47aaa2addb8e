use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub today: NaiveDate,
    pub christmas: NaiveDate,
    pub nights_until_christmas: i64,
}

/// Nights left before the next December 25th; zero on the day itself.
pub fn countdown(today: NaiveDate) -> Option<Countdown> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), 12, 25)?;
    let christmas = if today > this_year {
        NaiveDate::from_ymd_opt(today.year() + 1, 12, 25)?
    } else {
        this_year
    };
    Some(Countdown {
        today,
        christmas,
        nights_until_christmas: (christmas - today).num_days(),
    })
}
