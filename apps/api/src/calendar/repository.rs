use anyhow::Result;
use sqlx::PgPool;

use crate::models::calendar::{ContentRow, DayRow};

pub async fn list_days(pool: &PgPool) -> Result<Vec<DayRow>> {
    Ok(
        sqlx::query_as::<_, DayRow>("SELECT * FROM days ORDER BY day_number ASC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_day_by_number(pool: &PgPool, day_number: i32) -> Result<Option<DayRow>> {
    Ok(
        sqlx::query_as::<_, DayRow>("SELECT * FROM days WHERE day_number = $1")
            .bind(day_number)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn get_day_by_id(pool: &PgPool, id: i32) -> Result<Option<DayRow>> {
    Ok(sqlx::query_as::<_, DayRow>("SELECT * FROM days WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn contents_for_day(pool: &PgPool, day_id: i32) -> Result<Vec<ContentRow>> {
    Ok(sqlx::query_as::<_, ContentRow>(
        "SELECT * FROM contents WHERE day_id = $1 ORDER BY id ASC",
    )
    .bind(day_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_content(pool: &PgPool, id: i32) -> Result<Option<ContentRow>> {
    Ok(
        sqlx::query_as::<_, ContentRow>("SELECT * FROM contents WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}
