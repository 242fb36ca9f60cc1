//! Worker startup helper.
//!
//! [`spawn_worker`] binds the worker's endpoint and serves it on a
//! background Tokio task. The binary awaits the returned task; tests use
//! the reported address to point a broker at it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use golnet_proto::RpcServer;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::service::WorkerService;

/// Time open connections get to finish after a shutdown request.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// A worker serving on a background task.
#[derive(Debug)]
pub struct RunningWorker {
    /// Address actually bound.
    pub addr: SocketAddr,
    /// The service instance behind the endpoint.
    pub service: Arc<WorkerService>,
    /// Server task; finishes after `Worker.Shutdown`.
    pub handle: JoinHandle<()>,
}

/// Bind `config.bind_addr()` and serve a fresh [`WorkerService`] on a
/// background task.
///
/// # Errors
///
/// Returns [`WorkerError::Rpc`] if the address cannot be bound. The bind
/// happens before the task is spawned so misconfiguration surfaces here.
pub async fn spawn_worker(config: &WorkerConfig) -> Result<RunningWorker, WorkerError> {
    let server = RpcServer::bind(&config.bind_addr()).await?;
    let addr = server.local_addr()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = Arc::new(WorkerService::new(shutdown_tx));

    let served = Arc::clone(&service);
    let handle = tokio::spawn(async move {
        if let Err(e) = server.serve(served, shutdown_rx, SHUTDOWN_GRACE).await {
            tracing::error!(error = %e, "worker server exited with error");
        }
        tracing::info!("worker server stopped");
    });

    tracing::info!(%addr, "worker spawned on background task");
    Ok(RunningWorker {
        addr,
        service,
        handle,
    })
}
