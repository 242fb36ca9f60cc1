//! Error types for the worker node.

use golnet_proto::RpcError;
use golnet_types::GridError;

/// Errors that can occur while configuring or running a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Binding or serving the RPC endpoint failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// The region sent by the broker is malformed.
    #[error("malformed region: {0}")]
    Grid(#[from] GridError),

    /// The blocking compute task panicked or was cancelled.
    #[error("compute task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
