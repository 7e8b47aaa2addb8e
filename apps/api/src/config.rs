use anyhow::{Context, Result};
use chrono::FixedOffset;

use crate::scoring::reward::DEFAULT_REWARD_THRESHOLD;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Offset in which "today" and the calendar day of a score are computed.
    pub calendar_utc_offset_minutes: i32,
    /// Points needed for the December 25th surprise. Independent of the point table.
    pub reward_threshold: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            calendar_utc_offset_minutes: std::env::var("CALENDAR_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<i32>()
                .context("CALENDAR_UTC_OFFSET_MINUTES must be an integer")?,
            reward_threshold: std::env::var("REWARD_THRESHOLD")
                .map(|v| v.parse::<i64>())
                .unwrap_or(Ok(DEFAULT_REWARD_THRESHOLD))
                .context("REWARD_THRESHOLD must be an integer")?,
        })
    }

    pub fn calendar_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.calendar_utc_offset_minutes * 60).with_context(|| {
            format!(
                "CALENDAR_UTC_OFFSET_MINUTES={} is outside ±24h",
                self.calendar_utc_offset_minutes
            )
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(offset: i32) -> Config {
        Config {
            database_url: "postgres://localhost/advent".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            calendar_utc_offset_minutes: offset,
            reward_threshold: DEFAULT_REWARD_THRESHOLD,
        }
    }

    #[test]
    fn test_calendar_offset() {
        assert_eq!(config(60).calendar_offset().unwrap().local_minus_utc(), 3600);
        assert!(config(24 * 60).calendar_offset().is_err());
    }
}
