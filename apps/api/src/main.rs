mod calendar;
mod config;
mod content;
mod db;
mod errors;
mod models;
mod routes;
mod scores;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::calendar::CalendarClock;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::scores::PgScoreLedger;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "advent-api", version, about = "Advent calendar scoring API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import calendar data from a CSV file
    Import {
        #[arg(value_enum)]
        kind: ImportKind,
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Days,
    Contents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::Import { kind, path } => {
            let count = match kind {
                ImportKind::Days => content::import::import_days(&db, &path).await?,
                ImportKind::Contents => content::import::import_contents(&db, &path).await?,
            };
            info!("Import finished: {count} rows");
            Ok(())
        }
    }
}

async fn serve(config: Config, db: sqlx::PgPool) -> Result<()> {
    info!("Starting Advent API v{}", env!("CARGO_PKG_VERSION"));

    let offset = config.calendar_offset()?;
    let clock = CalendarClock::system(offset);
    info!(
        "Calendar offset {offset}, today is {}, reward threshold {}",
        clock.today(),
        config.reward_threshold
    );

    let state = AppState {
        ledger: Arc::new(PgScoreLedger::new(db.clone())),
        db,
        clock,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
