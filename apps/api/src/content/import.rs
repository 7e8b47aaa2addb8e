//! One-off CSV import of calendar days and contents.
//!
//! Rows are validated up front; the database write happens in a single
//! transaction so a bad file leaves nothing behind.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::content::kind::ContentKind;
use crate::scoring::{DayNumber, ScoringError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("CSV line {line}: {source}")]
    Invalid {
        line: u64,
        #[source]
        source: ScoringError,
    },

    #[error("CSV line {line}: day {day_number} appears twice")]
    DuplicateDay { line: u64, day_number: i32 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
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

#[derive(Debug, Clone, Deserialize)]
pub struct ContentRecord {
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    pub content1: Option<String>,
    pub content2: Option<String>,
    pub content3: Option<String>,
    pub content4: Option<String>,
    pub content5: Option<String>,
    #[serde(rename = "dayId")]
    pub day_id: i32,
}

// Header is line 1.
fn line_of(index: usize) -> u64 {
    index as u64 + 2
}

pub fn read_days<R: Read>(reader: R) -> Result<Vec<DayRecord>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen = HashSet::new();
    let mut days = Vec::new();

    for (i, result) in rdr.deserialize::<DayRecord>().enumerate() {
        let line = line_of(i);
        let record = result.map_err(|source| ImportError::Csv { line, source })?;
        DayNumber::new(record.day_number)
            .map_err(|source| ImportError::Invalid { line, source })?;
        if !seen.insert(record.day_number) {
            return Err(ImportError::DuplicateDay {
                line,
                day_number: record.day_number,
            });
        }
        days.push(record);
    }

    Ok(days)
}

pub fn read_contents<R: Read>(reader: R) -> Result<Vec<ContentRecord>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut contents = Vec::new();

    for (i, result) in rdr.deserialize::<ContentRecord>().enumerate() {
        let line = line_of(i);
        let mut record = result.map_err(|source| ImportError::Csv { line, source })?;
        for slot in [
            &mut record.content1,
            &mut record.content2,
            &mut record.content3,
            &mut record.content4,
            &mut record.content5,
        ] {
            if slot.as_deref().is_some_and(str::is_empty) {
                *slot = None;
            }
        }
        ContentKind::parse(
            &record.content_type,
            record.content3.as_deref(),
            record.content4.as_deref(),
            record.content5.as_deref(),
        )
        .map_err(|source| ImportError::Invalid { line, source })?;
        contents.push(record);
    }

    Ok(contents)
}

/// Inserts or refreshes days, keyed on their day number.
pub async fn import_days(pool: &PgPool, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let days = read_days(file)?;

    let mut tx = pool.begin().await?;
    for day in &days {
        sqlx::query(
            r#"
            INSERT INTO days
                (day_number, background, width, height, color, text_color,
                 image, aspect_ratio, quote, quote_author, quote_source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (day_number) DO UPDATE SET
                background = EXCLUDED.background,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                color = EXCLUDED.color,
                text_color = EXCLUDED.text_color,
                image = EXCLUDED.image,
                aspect_ratio = EXCLUDED.aspect_ratio,
                quote = EXCLUDED.quote,
                quote_author = EXCLUDED.quote_author,
                quote_source = EXCLUDED.quote_source
            "#,
        )
        .bind(day.day_number)
        .bind(&day.background)
        .bind(&day.width)
        .bind(&day.height)
        .bind(&day.color)
        .bind(&day.text_color)
        .bind(&day.image)
        .bind(day.aspect_ratio)
        .bind(&day.quote)
        .bind(&day.quote_author)
        .bind(&day.quote_source)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Imported {} days from {}", days.len(), path.display());
    Ok(days.len())
}

pub async fn import_contents(pool: &PgPool, path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let contents = read_contents(file)?;

    let mut tx = pool.begin().await?;
    for content in &contents {
        sqlx::query(
            r#"
            INSERT INTO contents
                (day_id, content_type, title, content1, content2, content3, content4, content5)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(content.day_id)
        .bind(&content.content_type)
        .bind(&content.title)
        .bind(&content.content1)
        .bind(&content.content2)
        .bind(&content.content3)
        .bind(&content.content4)
        .bind(&content.content5)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert content '{}'", content.title))?;
    }
    tx.commit().await?;

    info!("Imported {} contents from {}", contents.len(), path.display());
    Ok(contents.len())
}
