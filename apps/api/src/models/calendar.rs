use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::scoring::{DayNumber, ScoringError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayRow {
    pub id: i32,
    pub day_number: i32,
    pub background: String,
    pub width: String,
    pub height: String,
    pub color: String,
    pub text_color: String,
    pub image: String,
    pub aspect_ratio: f64,
    pub quote: String,
    pub quote_author: String,
    pub quote_source: String,
}

impl DayRow {
    pub fn number(&self) -> Result<DayNumber, ScoringError> {
        DayNumber::new(self.day_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentRow {
    pub id: i32,
    pub day_id: i32,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    pub content1: Option<String>,
    pub content2: Option<String>,
    pub content3: Option<String>,
    pub content4: Option<String>,
    pub content5: Option<String>,
}
