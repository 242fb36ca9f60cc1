//! The broker service: the run loop and the control methods.
//!
//! [`Broker::run`] owns the authoritative world for the duration of a run.
//! Between turns it checks, in order, the pause flag (parking until resume
//! or quit), then a pending quit, then computes one generation and
//! publishes the result. Pause, quit, report, save and shutdown run on
//! their own RPC tasks and only touch [`RunControl`] and [`SessionStore`].

use std::time::Instant;

use golnet_proto::methods::{
    BrokerPause, BrokerQuit, BrokerReport, BrokerRun, BrokerSave, BrokerShutdown, PauseResponse,
    QuitResponse, ReportResponse, RunRequest, RunResponse, SaveResponse, ShutdownResponse, names,
};
use golnet_proto::{RpcError, Service, decode_params, encode_result};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info};

use crate::control::{RunControl, RunState};
use crate::error::BrokerError;
use crate::orchestrator::{WorkerPool, advance};
use crate::session::{RunId, SessionSnapshot, SessionStore};

/// Broker state: a worker pool, the run control, and the session.
#[derive(Debug)]
pub struct Broker<P> {
    pool: P,
    control: RunControl,
    session: SessionStore,
    stop: watch::Sender<bool>,
}

impl<P: WorkerPool> Broker<P> {
    /// A broker with an empty session that signals `stop` on shutdown.
    pub fn new(pool: P, stop: watch::Sender<bool>) -> Self {
        Self {
            pool,
            control: RunControl::new(),
            session: SessionStore::new(),
            stop,
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Run `request.turns` generations from `request.world`.
    ///
    /// Returns the world reached and the number of turns this run
    /// completed, which is less than requested if the run was quit.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidWorld`] or
    /// [`BrokerError::TooManyWorkers`] before any turn is computed,
    /// [`BrokerError::RunInProgress`] if another run is active, and the
    /// turn's error if a worker fails. A failed run leaves the last
    /// completed snapshot in the session.
    pub async fn run(&self, request: RunRequest) -> Result<RunResponse, BrokerError> {
        let RunRequest { turns, world } = request;
        world.validate().map_err(BrokerError::InvalidWorld)?;
        world.validate_workers().map_err(BrokerError::InvalidWorld)?;
        if world.workers > self.pool.capacity() {
            return Err(BrokerError::TooManyWorkers {
                requested: world.workers,
                available: self.pool.capacity(),
            });
        }

        let guard = self.control.begin_run()?;
        let run_id = RunId::new();
        let epoch = self.session.begin(run_id, world.clone()).await;
        let started = Instant::now();
        info!(
            %run_id,
            turns,
            workers = world.workers,
            height = world.height,
            width = world.width,
            "run started"
        );

        let mut world = world;
        let mut completed: u64 = 0;
        let end = loop {
            if completed >= turns {
                break RunState::Completed;
            }
            if self.control.is_paused() {
                info!(%run_id, turns = completed, "run paused");
                self.control.wait_while_paused().await;
                if !self.control.is_paused() {
                    info!(%run_id, turns = completed, "run resumed");
                }
            }
            if self.control.take_quit() {
                break RunState::Quit;
            }
            if self.control.is_paused() {
                continue;
            }

            let next = match advance(&world, &self.pool).await {
                Ok(next) => next,
                Err(e) => {
                    error!(%run_id, turn = completed.saturating_add(1), error = %e, "turn failed");
                    return Err(e);
                }
            };
            completed = completed.saturating_add(1);
            world = next;
            self.session
                .publish(epoch, SessionSnapshot::new(run_id, completed, world.clone()))
                .await;
        };

        if end == RunState::Quit {
            // A quit that raced run start may have cleared the session
            // before `begin` repopulated it.
            self.session.reset().await;
        }
        guard.finish(end);
        info!(
            %run_id,
            end_state = %end,
            turns = completed,
            alive_cells = world.alive_count(),
            elapsed_ms = started.elapsed().as_millis(),
            "run ended"
        );
        Ok(RunResponse {
            world,
            turns: completed,
        })
    }

    /// Turns completed and alive cells as of the last completed turn.
    pub async fn report(&self) -> ReportResponse {
        let snapshot = self.session.current().await;
        ReportResponse {
            turns: snapshot.turns,
            alive_cells_count: snapshot.alive_cells_count,
        }
    }

    /// The latest world snapshot and its turn count.
    pub async fn save(&self) -> SaveResponse {
        let snapshot = self.session.current().await;
        SaveResponse {
            turns: snapshot.turns,
            world: snapshot.world.clone(),
        }
    }

    /// Toggle pause. Returns the new pause state.
    pub async fn pause(&self) -> PauseResponse {
        let is_paused = self.control.toggle_pause();
        let turns = self.session.current().await.turns;
        info!(is_paused, turns, "pause toggled");
        PauseResponse { turns, is_paused }
    }

    /// Abort the active run (if any) and clear the session.
    pub async fn quit(&self) -> QuitResponse {
        let turns = self.session.current().await.turns;
        let active = self.control.is_running();
        if active {
            self.control.request_quit();
        }
        self.session.reset().await;
        info!(turns, active_run = active, "quit requested, session cleared");
        QuitResponse { turns }
    }

    /// Abort the active run, tell every worker to terminate, and signal
    /// the server to stop once every worker has answered.
    pub async fn shutdown(&self) -> ShutdownResponse {
        let turns = self.session.current().await.turns;
        info!(turns, workers = self.pool.capacity(), "shutdown requested");
        self.control.request_quit();
        self.pool.shutdown_all().await;
        self.stop.send_replace(true);
        ShutdownResponse { turns }
    }
}

impl<P: WorkerPool> Service for Broker<P> {
    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            names::BROKER_RUN => {
                let request = decode_params::<BrokerRun>(params)?;
                let response = self.run(request).await.map_err(RpcError::handler)?;
                encode_result(&response)
            }
            names::BROKER_REPORT => {
                let _ = decode_params::<BrokerReport>(params)?;
                encode_result(&self.report().await)
            }
            names::BROKER_SAVE => {
                let _ = decode_params::<BrokerSave>(params)?;
                encode_result(&self.save().await)
            }
            names::BROKER_PAUSE => {
                let _ = decode_params::<BrokerPause>(params)?;
                encode_result(&self.pause().await)
            }
            names::BROKER_QUIT => {
                let _ = decode_params::<BrokerQuit>(params)?;
                encode_result(&self.quit().await)
            }
            names::BROKER_SHUTDOWN => {
                let _ = decode_params::<BrokerShutdown>(params)?;
                encode_result(&self.shutdown().await)
            }
            other => Err(RpcError::UnknownMethod(other.to_owned())),
        }
    }
}
