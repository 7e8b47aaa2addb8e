use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::countdown::{countdown, Countdown};
use crate::calendar::repository::{contents_for_day, get_day_by_number, list_days};
use crate::content::games::{group_games, DayGames};
use crate::errors::AppError;
use crate::models::calendar::{ContentRow, DayRow};
use crate::scores::service::{open_day, ActionTime, AwardOutcome, UserContext};
use crate::scoring::{DayNumber, DayRef, Timeliness};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DayDetailResponse {
    pub day: DayRow,
    pub is_open: bool,
    pub timeliness: Timeliness,
    pub contents: Vec<ContentRow>,
    #[serde(skip_serializing_if = "DayGames::is_empty")]
    pub games: DayGames,
}

#[derive(Debug, Serialize)]
pub struct OpeningResponse {
    pub day_number: DayNumber,
    pub is_open: bool,
}

#[derive(Debug, Serialize)]
pub struct OpenDayResponse {
    pub day_number: DayNumber,
    #[serde(flatten)]
    pub outcome: AwardOutcome,
}

/// Validates the path parameter and rejects cells that are still locked,
/// before any database access.
fn unlocked(day_number: i32, today: NaiveDate) -> Result<(DayNumber, Timeliness), AppError> {
    let number = DayNumber::new(day_number)?;
    let timeliness = Timeliness::evaluate(number, today)?;
    Ok((number, timeliness))
}

async fn load_day(state: &AppState, number: DayNumber) -> Result<DayRow, AppError> {
    get_day_by_number(&state.db, i32::from(number.get()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Day {number} not found")))
}

/// GET /api/v1/days
pub async fn handle_list_days(State(state): State<AppState>) -> Result<Json<Vec<DayRow>>, AppError> {
    Ok(Json(list_days(&state.db).await?))
}

/// GET /api/v1/days/:day_number
pub async fn handle_get_day(
    State(state): State<AppState>,
    Path(day_number): Path<i32>,
    Query(user): Query<UserContext>,
) -> Result<Json<DayDetailResponse>, AppError> {
    let (number, timeliness) = unlocked(day_number, state.clock.today())?;
    let day = load_day(&state, number).await?;
    let contents = contents_for_day(&state.db, day.id).await?;
    let games = group_games(&contents)?;
    let is_open = state.ledger.is_day_open(user.user_id, day.id).await?;

    Ok(Json(DayDetailResponse {
        day,
        is_open,
        timeliness,
        contents,
        games,
    }))
}

/// GET /api/v1/days/:day_number/opening
pub async fn handle_get_opening(
    State(state): State<AppState>,
    Path(day_number): Path<i32>,
    Query(user): Query<UserContext>,
) -> Result<Json<OpeningResponse>, AppError> {
    let number = DayNumber::new(day_number)?;
    let day = load_day(&state, number).await?;
    let is_open = state.ledger.is_day_open(user.user_id, day.id).await?;
    Ok(Json(OpeningResponse {
        day_number: number,
        is_open,
    }))
}

/// POST /api/v1/days/:day_number/open
pub async fn handle_open_day(
    State(state): State<AppState>,
    Path(day_number): Path<i32>,
    Json(user): Json<UserContext>,
) -> Result<Json<OpenDayResponse>, AppError> {
    let (number, _) = unlocked(day_number, state.clock.today())?;
    let day = load_day(&state, number).await?;
    let at = ActionTime {
        now: state.clock.now(),
        today: state.clock.today(),
    };
    let outcome = open_day(
        state.ledger.as_ref(),
        user,
        DayRef {
            id: day.id,
            day_number: number,
        },
        at,
    )
    .await?;

    Ok(Json(OpenDayResponse {
        day_number: number,
        outcome,
    }))
}

/// GET /api/v1/calendar/countdown
pub async fn handle_countdown(State(state): State<AppState>) -> Result<Json<Countdown>, AppError> {
    let today = state.clock.today();
    countdown(today)
        .map(Json)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No Christmas date for {today}")))
}
