//! Client entry point.
//!
//! Loads `{images_dir}/{width}x{height}.pgm`, runs it on the broker for the
//! configured number of turns, and writes the final world to the output
//! directory. While the run is in flight, stdin lines steer it:
//! `s` saves a checkpoint, `p` toggles pause, `q` quits the run, `k` shuts
//! the broker and workers down.

mod config;
mod driver;
mod error;
mod keys;
mod pgm;
mod reporter;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the input image cannot be
/// used, the run fails, or the final image cannot be written.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env()?;
    info!(
        broker = %config.broker_addr,
        turns = config.turns,
        width = config.image_width,
        height = config.image_height,
        workers = config.workers,
        "configuration loaded"
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let result = runtime.block_on(driver::run(&config, BufReader::new(tokio::io::stdin())));
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();

    let summary = result?;
    info!(
        turns = summary.turns,
        alive_cells = summary.alive_cells.len(),
        output = %summary.output.display(),
        "golnet-client finished"
    );
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
