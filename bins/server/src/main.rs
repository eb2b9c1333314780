//! Ledgerline API Server
//!
//! Main entry point for the journal and period service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline_api::{AppState, create_router};
use ledgerline_core::clock::SystemClock;
use ledgerline_core::journal::{EntryNumbering, JournalService};
use ledgerline_core::period::PeriodService;
use ledgerline_core::store::LedgerStore;
use ledgerline_db::{PgLedgerStore, connect, migration::Migrator};
use ledgerline_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let json_logs = config.log.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerline=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let db = connect(&config.database).await?;
    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(db));
    let clock = Arc::new(SystemClock);
    let numbering = EntryNumbering::new(&config.numbering);
    info!(
        scan_fallback = numbering.allows_scan_fallback(),
        "Entry numbering configured"
    );

    let state = AppState {
        journal: JournalService::new(store.clone(), clock.clone(), numbering),
        periods: PeriodService::new(store, clock, numbering),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
