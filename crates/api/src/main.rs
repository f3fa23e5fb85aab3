use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn};

use practice_api::app::{build_router, AppState};
use practice_api::config::Config;
use practice_api::jobs::{
    CompletePastBookingsJob, InboxPollJob, JobScheduler, PoolMetricsJob, SessionCleanupJob,
};
use practice_api::middleware::{init_logging, metrics::init_metrics};
use practice_api::services::admin_bootstrap::{bootstrap_admin, BootstrapOutcome};
use practice_api::services::InboxSyncService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);

    if let Err(e) = init_metrics() {
        warn!(error = %e, "Metrics exporter disabled");
    }

    info!("Starting practice API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_settings()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    match bootstrap_admin(&pool, &config.admin).await? {
        BootstrapOutcome::Created => info!(email = %config.admin.bootstrap_email, "Initial admin account created"),
        BootstrapOutcome::AlreadyInitialized => {}
        BootstrapOutcome::NotConfigured => {
            info!("No admin bootstrap configured")
        }
    }

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool.clone())?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.register(CompletePastBookingsJob::new(pool.clone()));
    scheduler.register(SessionCleanupJob::new(pool.clone()));
    if state.config.inbox.enabled {
        match state.graph.clone() {
            Some(graph) => scheduler.register(InboxPollJob::new(
                InboxSyncService::new(pool.clone(), &state.config, Some(graph)),
                state.config.inbox.poll_interval_minutes,
            )),
            None => warn!("Inbox polling enabled but Graph is not configured"),
        }
    }
    scheduler.start();

    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Stopping background jobs");
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
