//! Error types for the broker.
//!
//! Handler errors are turned into the error string of the RPC response, so
//! every variant's message is written for the client that made the call.

use golnet_proto::RpcError;
use golnet_types::GridError;

use crate::config::ConfigError;

/// Errors that can occur while configuring the broker or running turns.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The world sent with `Broker.Run` is malformed or cannot be split
    /// across its worker count.
    #[error("invalid world: {0}")]
    InvalidWorld(GridError),

    /// The world asks for more workers than the broker knows.
    #[error("world asks for {requested} workers but only {available} are configured")]
    TooManyWorkers {
        /// Worker count requested by the world.
        requested: usize,
        /// Worker addresses configured.
        available: usize,
    },

    /// Another `Broker.Run` is still active.
    #[error("run already in progress")]
    RunInProgress,

    /// Dispatching a region to a worker failed.
    #[error("worker {index} ({addr}) failed: {source}")]
    Worker {
        /// Worker index in the pool.
        index: usize,
        /// Worker address.
        addr: String,
        /// The RPC failure.
        #[source]
        source: RpcError,
    },

    /// A region was addressed to a worker index outside the pool.
    #[error("no worker at index {0}")]
    NoSuchWorker(usize),

    /// The bands returned for a turn could not be turned into a grid.
    #[error("turn failed: {0}")]
    Turn(GridError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Binding or serving the RPC endpoint failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
}
