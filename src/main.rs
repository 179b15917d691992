use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tutor_hub::adapters::clock::SystemClock;
use tutor_hub::adapters::http::app_router;
use tutor_hub::adapters::pool::{self, IdleConnectionReaper, PoolConfig};
use tutor_hub::adapters::postgres::{run_migrations, PgConnector};
use tutor_hub::application::{SessionCleanupScheduler, SessionStore};
use tutor_hub::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    let (db_host, db_port) = config.database.host_and_port();
    info!(
        environment = ?config.server.environment,
        db_host = %db_host,
        db_port,
        database = %config.database.name,
        "Starting tutor-hub"
    );

    let pool = pool::global();
    pool.initialize(
        PgConnector::from_config(&config.database),
        PoolConfig::from(&config.database),
    )
    .await
    .context("failed to initialize connection pool")?;

    if config.database.run_migrations {
        run_migrations(pool)
            .await
            .context("failed to run database migrations")?;
    }

    let reaper = IdleConnectionReaper::new(pool.clone())
        .with_idle_threshold(config.reaper.idle_threshold());
    if config.reaper.enabled {
        reaper.start(config.reaper.interval());
    } else {
        warn!("Idle connection reaper disabled by configuration");
    }

    let store = SessionStore::new(pool.clone(), Arc::new(SystemClock))
        .with_default_ttl(config.session.ttl());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = SessionCleanupScheduler::new(store.clone())
        .with_interval(config.session.cleanup_interval())
        .spawn(shutdown_rx);

    let app = app_router(store, pool.clone())
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup.await {
        warn!(error = %e, "Session cleanup task ended abnormally");
    }
    reaper.stop(config.reaper.stop_timeout()).await;
    pool.shutdown().await;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
