//! Worker node entry point.
//!
//! Binds the configured port and answers `Worker.ComputeRegion` calls from
//! the broker until a `Worker.Shutdown` arrives.

use golnet_worker::{WorkerConfig, spawn_worker};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the port cannot be bound.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("golnet-worker starting");

    let config = WorkerConfig::from_env()?;
    info!(host = config.host, port = config.port, "configuration loaded");

    let worker = spawn_worker(&config).await?;
    info!(addr = %worker.addr, "worker ready");

    worker.handle.await?;
    info!("golnet-worker exiting");
    Ok(())
}

/// Structured logging; `GOLNET_LOG_FORMAT=json` selects JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("GOLNET_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
