//! Broker startup helper.
//!
//! Provides [`spawn_broker`], which binds the broker's endpoint and serves
//! it on a background Tokio task. The binary awaits the returned handle;
//! integration tests bind port 0 and read back the address.

use std::net::SocketAddr;
use std::sync::Arc;

use golnet_proto::RpcServer;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::broker::Broker;
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::orchestrator::RpcWorkerPool;

/// A broker serving on a background task.
#[derive(Debug)]
pub struct RunningBroker {
    /// Address actually bound.
    pub addr: SocketAddr,
    /// The broker behind the endpoint.
    pub broker: Arc<Broker<RpcWorkerPool>>,
    /// Server task; finishes after `Broker.Shutdown` once open
    /// connections drain or the grace period runs out.
    pub handle: JoinHandle<()>,
}

/// Bind `config.bind_addr()` and serve a broker over the configured
/// workers on a background task.
///
/// # Errors
///
/// Returns [`BrokerError::Config`] if no workers are configured and
/// [`BrokerError::Rpc`] if the address cannot be bound. Both are detected
/// before the background task is spawned.
pub async fn spawn_broker(config: &BrokerConfig) -> Result<RunningBroker, BrokerError> {
    config.validate()?;
    let server = RpcServer::bind(&config.bind_addr()).await?;
    let addr = server.local_addr()?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let pool = RpcWorkerPool::new(config.workers.iter().cloned());
    let broker = Arc::new(Broker::new(pool, stop_tx));

    let served = Arc::clone(&broker);
    let grace = config.shutdown_grace();
    let handle = tokio::spawn(async move {
        if let Err(e) = server.serve(served, stop_rx, grace).await {
            tracing::error!(error = %e, "broker server exited with error");
        }
        tracing::info!("broker server stopped");
    });

    tracing::info!(%addr, workers = config.workers.len(), "broker spawned on background task");
    Ok(RunningBroker {
        addr,
        broker,
        handle,
    })
}
