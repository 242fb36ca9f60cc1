//! Method table for the broker and worker services.
//!
//! Each callable method is a zero-sized marker type implementing
//! [`Method`], which binds the wire identifier to the request and
//! response records. Field names are camelCase on the wire.

use golnet_types::{Region, World};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wire identifiers of every method.
pub mod names {
    /// Run a number of turns on a world.
    pub const BROKER_RUN: &str = "Broker.Run";
    /// Report turns completed and alive cells.
    pub const BROKER_REPORT: &str = "Broker.Report";
    /// Fetch the latest world snapshot.
    pub const BROKER_SAVE: &str = "Broker.Save";
    /// Toggle pause.
    pub const BROKER_PAUSE: &str = "Broker.Pause";
    /// Abort the run and clear the session.
    pub const BROKER_QUIT: &str = "Broker.Quit";
    /// Stop the workers and the broker.
    pub const BROKER_SHUTDOWN: &str = "Broker.Shutdown";
    /// Compute one generation of a region.
    pub const WORKER_COMPUTE_REGION: &str = "Worker.ComputeRegion";
    /// Stop the worker.
    pub const WORKER_SHUTDOWN: &str = "Worker.Shutdown";
}

/// A callable RPC method.
pub trait Method {
    /// Wire identifier, e.g. `Broker.Run`.
    const NAME: &'static str;
    /// Request record.
    type Request: Serialize + DeserializeOwned + Send + 'static;
    /// Response record.
    type Response: Serialize + DeserializeOwned + Send + 'static;
}

macro_rules! define_method {
    (
        $(#[$meta:meta])*
        $marker:ident, $name:expr, $request:ty => $response:ty
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $marker;

        impl Method for $marker {
            const NAME: &'static str = $name;
            type Request = $request;
            type Response = $response;
        }
    };
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// Request for [`BrokerRun`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Number of turns to run.
    pub turns: u64,
    /// Initial world.
    pub world: World,
}

/// Response for [`BrokerRun`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// World reached when the run ended.
    pub world: World,
    /// Turns completed by this run.
    pub turns: u64,
}

/// Request for [`BrokerReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {}

/// Response for [`BrokerReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Turns completed so far.
    pub turns: u64,
    /// Alive cells as of the last completed turn.
    pub alive_cells_count: u64,
}

/// Request for [`BrokerSave`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {}

/// Response for [`BrokerSave`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Turns completed so far.
    pub turns: u64,
    /// Latest world snapshot.
    pub world: World,
}

/// Request for [`BrokerPause`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseRequest {}

/// Response for [`BrokerPause`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseResponse {
    /// Turns completed so far.
    pub turns: u64,
    /// Pause state after the toggle.
    pub is_paused: bool,
}

/// Request for [`BrokerQuit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuitRequest {}

/// Response for [`BrokerQuit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitResponse {
    /// Turns completed when the quit arrived.
    pub turns: u64,
}

/// Request for [`BrokerShutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownRequest {}

/// Response for [`BrokerShutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownResponse {
    /// Turns completed when the shutdown arrived.
    pub turns: u64,
}

define_method! {
    /// `Broker.Run`: run `turns` generations starting from `world`.
    BrokerRun, names::BROKER_RUN, RunRequest => RunResponse
}

define_method! {
    /// `Broker.Report`: progress of the current run.
    BrokerReport, names::BROKER_REPORT, ReportRequest => ReportResponse
}

define_method! {
    /// `Broker.Save`: latest world snapshot for checkpointing.
    BrokerSave, names::BROKER_SAVE, SaveRequest => SaveResponse
}

define_method! {
    /// `Broker.Pause`: toggle between paused and running.
    BrokerPause, names::BROKER_PAUSE, PauseRequest => PauseResponse
}

define_method! {
    /// `Broker.Quit`: abort the run and clear the session.
    BrokerQuit, names::BROKER_QUIT, QuitRequest => QuitResponse
}

define_method! {
    /// `Broker.Shutdown`: stop every worker, then the broker.
    BrokerShutdown, names::BROKER_SHUTDOWN, ShutdownRequest => ShutdownResponse
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Request for [`WorkerComputeRegion`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRegionRequest {
    /// Band plus halo rows.
    pub region: Region,
}

/// Response for [`WorkerComputeRegion`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRegionResponse {
    /// Recomputed band rows only.
    pub region: Region,
}

/// Request for [`WorkerShutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerShutdownRequest {}

/// Response for [`WorkerShutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerShutdownResponse {}

define_method! {
    /// `Worker.ComputeRegion`: apply one generation to a region.
    WorkerComputeRegion, names::WORKER_COMPUTE_REGION, ComputeRegionRequest => ComputeRegionResponse
}

define_method! {
    /// `Worker.Shutdown`: stop the worker process.
    WorkerShutdown, names::WORKER_SHUTDOWN, WorkerShutdownRequest => WorkerShutdownResponse
}
