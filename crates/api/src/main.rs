use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use domain::services::{InMemoryInviteStore, SpectatorInviteStore};
use persistence::repositories::SpectatorInviteRepository;
use tracing::{info, warn};

use spectate_api::app::{create_app, AppState};
use spectate_api::config::Config;
use spectate_api::jobs::{ExpireInvitesJob, JobScheduler};
use spectate_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting Spectate API v{}", env!("CARGO_PKG_VERSION"));

    let (store, pool) = if config.database.is_in_memory() {
        warn!("database.url is empty, invites are kept in memory");
        let store: Arc<dyn SpectatorInviteStore> = Arc::new(InMemoryInviteStore::new());
        (store, None)
    } else {
        let db_config = persistence::db::DatabaseConfig::from(&config.database);
        let pool = persistence::db::create_pool(&db_config).await?;

        info!("Running database migrations...");
        persistence::db::run_migrations(&pool).await?;
        info!("Migrations completed");

        let store: Arc<dyn SpectatorInviteStore> =
            Arc::new(SpectatorInviteRepository::new(pool.clone()));
        (store, Some(pool))
    };

    let addr = config.socket_addr()?;
    let sweep_interval = config.invites.expiry_sweep_interval_secs;
    let state = AppState::new(config, store, pool)?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(ExpireInvitesJob::new(state.invites.clone(), sweep_interval));
    scheduler.start();

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
