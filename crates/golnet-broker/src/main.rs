//! Broker entry point.
//!
//! Loads `golnet-broker.yaml` and environment overrides, binds the listen
//! port, and serves client calls until `Broker.Shutdown`.

use golnet_broker::{BrokerConfig, spawn_broker};
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

    info!("golnet-broker starting");

    let config = BrokerConfig::load()?;
    info!(
        listen = %config.bind_addr(),
        workers = ?config.workers,
        shutdown_grace_ms = config.shutdown_grace_ms,
        "configuration loaded"
    );

    let broker = spawn_broker(&config).await?;
    info!(addr = %broker.addr, "broker ready");

    broker.handle.await?;
    info!("golnet-broker exiting");
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
