use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use thermolink_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteStateStore};
use thermolinkd::config::Config;
use thermolinkd::units::RunningUnits;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig::new(config.database_url())
        .with_busy_timeout(Duration::from_millis(config.database.busy_timeout_ms))
        .build()
        .await
        .context("failed to open database")?;
    let store = Arc::new(SqliteStateStore::new(db.pool().clone()));

    // Units
    let mut units = RunningUnits::start(&config.units, store)
        .await
        .context("failed to start units")?;
    let simulation = units
        .take_simulation()
        .spawn(Duration::from_secs(config.simulation.tick_secs));

    // HTTP
    let app = thermolink_adapter_http_axum::router::build(units.app_state());
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, units = units.len(), "thermolinkd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutting down");
    simulation.abort();
    units.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
    }
}
