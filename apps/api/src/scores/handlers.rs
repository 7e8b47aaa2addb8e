use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::repository::{get_content, get_day_by_id};
use crate::errors::AppError;
use crate::models::calendar::ContentRow;
use crate::scores::service::{
    answer_game, connect_user, discover_content, score_summary, ActionTime, AnswerResult,
    AwardOutcome, ScoreSummary, UserContext,
};
use crate::scoring::reward::theoretical_max_points;
use crate::scoring::rules::{point_table, PointRule, MAX_POINTS_PER_DAY};
use crate::scoring::DayRef;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AwardResponse {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub outcome: AwardOutcome,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub user_id: Uuid,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: Vec<PointRule>,
    pub max_points_per_day: u32,
    pub reward_threshold: i64,
    pub theoretical_max_points: i64,
}

/// Loads a content with the day it belongs to.
async fn content_with_day(state: &AppState, id: i32) -> Result<(ContentRow, DayRef), AppError> {
    let content = get_content(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {id} not found")))?;
    let day = get_day_by_id(&state.db, content.day_id).await?.ok_or_else(|| {
        AppError::DataIntegrity(format!("Content {id} points to missing day {}", content.day_id))
    })?;
    let day_ref = DayRef {
        id: day.id,
        day_number: day.number()?,
    };
    Ok((content, day_ref))
}

fn action_time(state: &AppState) -> ActionTime {
    ActionTime {
        now: state.clock.now(),
        today: state.clock.today(),
    }
}

/// POST /api/v1/users/connect
pub async fn handle_connect(
    State(state): State<AppState>,
    Json(user): Json<UserContext>,
) -> Result<Json<AwardResponse>, AppError> {
    let outcome = connect_user(state.ledger.as_ref(), user, state.clock.now()).await?;
    Ok(Json(AwardResponse {
        user_id: user.user_id,
        outcome,
    }))
}

/// GET /api/v1/scores
pub async fn handle_get_scores(
    State(state): State<AppState>,
    Query(user): Query<UserContext>,
) -> Result<Json<ScoreSummary>, AppError> {
    let summary = score_summary(
        state.ledger.as_ref(),
        user,
        state.clock.offset(),
        state.config.reward_threshold,
        state.clock.today(),
    )
    .await?;
    Ok(Json(summary))
}

/// GET /api/v1/scoring/rules
pub async fn handle_rules(State(state): State<AppState>) -> Json<RulesResponse> {
    Json(RulesResponse {
        rules: point_table(),
        max_points_per_day: MAX_POINTS_PER_DAY,
        reward_threshold: state.config.reward_threshold,
        theoretical_max_points: theoretical_max_points(),
    })
}

/// POST /api/v1/contents/:id/discover
pub async fn handle_discover(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(user): Json<UserContext>,
) -> Result<Json<AwardResponse>, AppError> {
    let (content, day) = content_with_day(&state, id).await?;
    let outcome =
        discover_content(state.ledger.as_ref(), user, day, content.id, action_time(&state)).await?;
    Ok(Json(AwardResponse {
        user_id: user.user_id,
        outcome,
    }))
}

/// POST /api/v1/contents/:id/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResult>, AppError> {
    let (content, day) = content_with_day(&state, id).await?;
    let user = UserContext {
        user_id: req.user_id,
    };
    let result = answer_game(
        state.ledger.as_ref(),
        user,
        day,
        &content,
        &req.answer,
        action_time(&state),
    )
    .await?;
    Ok(Json(result))
}
