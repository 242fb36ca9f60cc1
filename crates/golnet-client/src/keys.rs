//! Key commands read line by line while a run is in flight.
//!
//! | Key | Effect |
//! |---|---|
//! | `s` | checkpoint the current world to the output directory |
//! | `q` | quit the run and stop listening |
//! | `k` | shut the broker and its workers down and stop listening |
//! | `p` | toggle pause |

use std::ops::ControlFlow;

use golnet_proto::RpcClient;
use golnet_proto::methods::{
    BrokerPause, BrokerQuit, BrokerSave, BrokerShutdown, PauseRequest, QuitRequest, SaveRequest,
    ShutdownRequest,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::pgm;

/// A key command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Save a checkpoint.
    Save,
    /// Quit the run.
    Quit,
    /// Shut the cluster down.
    Shutdown,
    /// Toggle pause.
    Pause,
}

impl Command {
    /// Parse one input line. Surrounding whitespace is ignored; anything
    /// other than a known key yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "s" => Some(Self::Save),
            "q" => Some(Self::Quit),
            "k" => Some(Self::Shutdown),
            "p" => Some(Self::Pause),
            _ => None,
        }
    }
}

/// Read commands from `input` until it ends, a `q` or `k` is handled, or
/// `stop` turns `true`.
pub fn spawn_key_listener<R>(
    input: R,
    client: RpcClient,
    config: ClientConfig,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                () = async { let _ = stop.wait_for(|stop| *stop).await; } => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "reading key commands failed");
                    break;
                }
            };
            let Some(command) = Command::parse(&line) else {
                if !line.trim().is_empty() {
                    warn!(key = line.trim(), "unknown key");
                }
                continue;
            };
            match handle(command, &client, &config).await {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(e) => warn!(?command, error = %e, "key command failed"),
            }
        }
    })
}

async fn handle(
    command: Command,
    client: &RpcClient,
    config: &ClientConfig,
) -> anyhow::Result<ControlFlow<()>> {
    match command {
        Command::Save => {
            let saved = client.call::<BrokerSave>(&SaveRequest {}).await?;
            if saved.world.width == 0 || saved.world.height == 0 {
                warn!("no world to save yet");
                return Ok(ControlFlow::Continue(()));
            }
            let path = config.output_path(saved.turns);
            pgm::write_file(&path, &saved.world.field).await?;
            info!(turns = saved.turns, path = %path.display(), "checkpoint saved");
            Ok(ControlFlow::Continue(()))
        }
        Command::Quit => {
            let quit = client.call::<BrokerQuit>(&QuitRequest {}).await?;
            info!(turns = quit.turns, "quit requested");
            Ok(ControlFlow::Break(()))
        }
        Command::Shutdown => {
            let shutdown = client.call::<BrokerShutdown>(&ShutdownRequest {}).await?;
            info!(turns = shutdown.turns, "shutdown requested");
            Ok(ControlFlow::Break(()))
        }
        Command::Pause => {
            let pause = client.call::<BrokerPause>(&PauseRequest {}).await?;
            if pause.is_paused {
                info!(turns = pause.turns, "Paused");
            } else {
                info!(turns = pause.turns, "Executing");
            }
            Ok(ControlFlow::Continue(()))
        }
    }
}
