use std::sync::Arc;

use sqlx::PgPool;

use crate::calendar::CalendarClock;
use crate::config::Config;
use crate::scores::ScoreLedger;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Score storage. Default: `PgScoreLedger` over the same pool.
    pub ledger: Arc<dyn ScoreLedger>,
    pub clock: CalendarClock,
    pub config: Config,
}
