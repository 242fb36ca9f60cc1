//! One client session: load the input image, run it on the broker, and
//! write the final image.

use std::path::PathBuf;

use anyhow::Context;
use golnet_proto::RpcClient;
use golnet_proto::methods::{BrokerRun, RunRequest};
use golnet_types::{Cell, World};
use tokio::io::AsyncBufRead;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::keys::spawn_key_listener;
use crate::pgm;
use crate::reporter::spawn_reporter;

/// Outcome of a finished run.
#[derive(Debug)]
pub struct RunSummary {
    /// Turns the broker completed.
    pub turns: u64,
    /// Alive cells of the final world.
    pub alive_cells: Vec<Cell>,
    /// Where the final image was written.
    pub output: PathBuf,
}

/// Drive one run, reading key commands from `keys`.
///
/// # Errors
///
/// Fails if the input image is missing, malformed or not the configured
/// size, if the broker rejects or fails the run, or if the final image
/// cannot be written.
pub async fn run<R>(config: &ClientConfig, keys: R) -> anyhow::Result<RunSummary>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let input = config.input_path();
    let grid = pgm::read_file(&input).await?;
    if grid.width() != config.image_width || grid.height() != config.image_height {
        return Err(ClientError::ImageSize {
            path: input,
            width: config.image_width,
            height: config.image_height,
            actual_width: grid.width(),
            actual_height: grid.height(),
        }
        .into());
    }
    let world = World::new(grid, config.workers);
    info!(
        path = %input.display(),
        alive_cells = world.alive_count(),
        "input image loaded"
    );

    let client = RpcClient::new(config.broker_addr.clone());
    let (stop_tx, stop_rx) = watch::channel(false);
    let reporter = spawn_reporter(client.clone(), config.report_interval, stop_rx.clone());
    let listener = spawn_key_listener(keys, client.clone(), config.clone(), stop_rx);

    info!(
        broker = %config.broker_addr,
        turns = config.turns,
        workers = config.workers,
        "run requested"
    );
    let result = client
        .call::<BrokerRun>(&RunRequest {
            turns: config.turns,
            world,
        })
        .await;

    stop_tx.send_replace(true);
    for task in [reporter, listener] {
        if let Err(e) = task.await {
            warn!(error = %e, "client task ended abnormally");
        }
    }

    let response = result
        .map_err(ClientError::from)
        .with_context(|| format!("run on broker {} failed", config.broker_addr))?;

    let output = config.output_path(response.turns);
    pgm::write_file(&output, &response.world.field).await?;

    let alive_cells = response.world.alive_cells();
    info!(
        turns = response.turns,
        alive_cells = alive_cells.len(),
        path = %output.display(),
        "final world written"
    );
    debug!(
        cells = ?alive_cells.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>(),
        "final alive cells"
    );

    Ok(RunSummary {
        turns: response.turns,
        alive_cells,
        output,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use golnet_broker::{BrokerConfig, ListenConfig, spawn_broker};
    use golnet_types::{Grid, step_grid};
    use golnet_worker::{WorkerConfig, spawn_worker};

    use super::*;
    use crate::test_support::{LocalBroker, client_config, scratch_dir};

    fn glider(size: usize) -> Grid {
        Grid::from_alive(size, size, &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)])
    }

    async fn write_input(config: &ClientConfig, grid: &Grid) {
        pgm::write_file(&config.input_path(), grid).await.unwrap();
    }

    #[tokio::test]
    async fn runs_an_image_through_real_workers() {
        let mut addrs = Vec::new();
        for _ in 0..2 {
            let worker = spawn_worker(&WorkerConfig {
                host: "127.0.0.1".to_owned(),
                port: 0,
            })
            .await
            .unwrap();
            addrs.push(worker.addr.to_string());
        }
        let broker = spawn_broker(&BrokerConfig {
            listen: ListenConfig {
                host: "127.0.0.1".to_owned(),
                port: 0,
            },
            workers: addrs,
            shutdown_grace_ms: 100,
        })
        .await
        .unwrap();

        let dir = scratch_dir();
        let mut config = client_config(&broker.addr.to_string(), dir.clone(), 16, 16);
        config.turns = 8;
        config.workers = 2;
        write_input(&config, &glider(16)).await;

        let summary = run(&config, tokio::io::empty()).await.unwrap();

        let mut expected = glider(16);
        for _ in 0..8 {
            expected = step_grid(&expected).unwrap();
        }
        assert_eq!(summary.turns, 8);
        assert_eq!(summary.output, dir.join("16x16x8.pgm"));
        assert_eq!(summary.alive_cells, expected.alive_cells());
        assert_eq!(pgm::read_file(&summary.output).await.unwrap(), expected);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn zero_turns_writes_the_input_back() {
        let broker = LocalBroker::start(1).await;
        let dir = scratch_dir();
        let mut config = client_config(&broker.addr, dir.clone(), 8, 8);
        config.turns = 0;
        write_input(&config, &glider(8)).await;

        let summary = run(&config, tokio::io::empty()).await.unwrap();

        assert_eq!(summary.turns, 0);
        assert_eq!(pgm::read_file(&dir.join("8x8x0.pgm")).await.unwrap(), glider(8));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn wrong_image_size_is_rejected() {
        let dir = scratch_dir();
        let config = client_config("127.0.0.1:9", dir.clone(), 16, 16);
        pgm::write_file(&config.input_path(), &glider(8)).await.unwrap();

        let err = run(&config, tokio::io::empty()).await.unwrap_err();

        match err.downcast_ref::<ClientError>() {
            Some(ClientError::ImageSize { actual_width, .. }) => assert_eq!(*actual_width, 8),
            other => panic!("unexpected error: {other:?}"),
        }
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_image_names_the_path() {
        let config = client_config("127.0.0.1:9", scratch_dir(), 16, 16);

        let err = run(&config, tokio::io::empty()).await.unwrap_err();

        assert!(format!("{err:#}").contains("16x16.pgm"), "{err:#}");
    }

    #[tokio::test]
    async fn unreachable_broker_fails_the_run() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap().to_string();
        drop(listener);
        let dir = scratch_dir();
        let config = client_config(&dead, dir.clone(), 8, 8);
        write_input(&config, &glider(8)).await;

        let err = run(&config, tokio::io::empty()).await.unwrap_err();

        assert!(format!("{err:#}").contains(&dead), "{err:#}");
        assert!(!dir.join("8x8x1.pgm").exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
