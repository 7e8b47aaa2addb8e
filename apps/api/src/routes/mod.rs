pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::calendar::handlers as calendar;
use crate::scores::handlers as scores;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/v1/users/connect", post(scores::handle_connect))
        // Calendar
        .route("/api/v1/days", get(calendar::handle_list_days))
        .route("/api/v1/days/:day_number", get(calendar::handle_get_day))
        .route(
            "/api/v1/days/:day_number/opening",
            get(calendar::handle_get_opening),
        )
        .route(
            "/api/v1/days/:day_number/open",
            post(calendar::handle_open_day),
        )
        .route(
            "/api/v1/calendar/countdown",
            get(calendar::handle_countdown),
        )
        // Contents
        .route(
            "/api/v1/contents/:id/discover",
            post(scores::handle_discover),
        )
        .route("/api/v1/contents/:id/answer", post(scores::handle_answer))
        // Scores
        .route("/api/v1/scores", get(scores::handle_get_scores))
        .route("/api/v1/scoring/rules", get(scores::handle_rules))
        .with_state(state)
}
