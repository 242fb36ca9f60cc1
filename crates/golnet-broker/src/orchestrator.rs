//! Turn orchestration: fan regions out to workers, fan bands back in.
//!
//! [`advance`] moves a world forward exactly one generation. It derives one
//! region per worker, dispatches all of them concurrently, waits for every
//! dispatch to finish, and splices the returned bands back together in
//! worker-index order.
//!
//! Workers sit behind the [`WorkerPool`] trait. [`RpcWorkerPool`] is the
//! networked pool the broker binary uses; [`LocalWorkerPool`] applies the
//! rule in-process and serves as a stand-in where no worker fleet exists.

use std::future::Future;

use futures::future::join_all;
use golnet_proto::RpcClient;
use golnet_proto::methods::{
    ComputeRegionRequest, WorkerComputeRegion, WorkerShutdown, WorkerShutdownRequest,
};
use golnet_types::{Region, World, reassemble, regions, step_region};
use tracing::{debug, info, warn};

use crate::error::BrokerError;

/// A fixed set of workers addressable by index.
pub trait WorkerPool: Send + Sync + 'static {
    /// Number of workers in the pool.
    fn capacity(&self) -> usize;

    /// Apply one generation to `region` on worker `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the worker is unknown or the computation
    /// fails. Any single failure fails the whole turn.
    fn compute(
        &self,
        index: usize,
        region: Region,
    ) -> impl Future<Output = Result<Region, BrokerError>> + Send;

    /// Ask every worker to terminate and wait until each call has
    /// answered or failed. Failures are logged, never returned.
    fn shutdown_all(&self) -> impl Future<Output = ()> + Send;
}

/// Workers reached over RPC, one connection per dispatch.
#[derive(Debug, Clone)]
pub struct RpcWorkerPool {
    clients: Vec<RpcClient>,
}

impl RpcWorkerPool {
    /// Build a pool from worker addresses in worker-index order.
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clients: addrs.into_iter().map(RpcClient::new).collect(),
        }
    }
}

impl WorkerPool for RpcWorkerPool {
    fn capacity(&self) -> usize {
        self.clients.len()
    }

    async fn compute(&self, index: usize, region: Region) -> Result<Region, BrokerError> {
        let client = self
            .clients
            .get(index)
            .ok_or(BrokerError::NoSuchWorker(index))?;
        debug!(
            worker = index,
            addr = client.addr(),
            start = region.start,
            end = region.end,
            "dispatching region"
        );
        let response = client
            .call::<WorkerComputeRegion>(&ComputeRegionRequest { region })
            .await
            .map_err(|source| BrokerError::Worker {
                index,
                addr: client.addr().to_owned(),
                source,
            })?;
        Ok(response.region)
    }

    async fn shutdown_all(&self) {
        let calls = self.clients.iter().enumerate().map(|(index, client)| async move {
            match client.call::<WorkerShutdown>(&WorkerShutdownRequest {}).await {
                Ok(_) => info!(worker = index, addr = client.addr(), "worker shut down"),
                Err(e) => warn!(
                    worker = index,
                    addr = client.addr(),
                    error = %e,
                    "worker shutdown failed"
                ),
            }
        });
        join_all(calls).await;
    }
}

/// In-process pool of `capacity` virtual workers.
#[derive(Debug, Clone, Copy)]
pub struct LocalWorkerPool {
    capacity: usize,
}

impl LocalWorkerPool {
    /// A pool that accepts up to `capacity` workers per world.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl WorkerPool for LocalWorkerPool {
    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn compute(&self, index: usize, region: Region) -> Result<Region, BrokerError> {
        if index >= self.capacity {
            return Err(BrokerError::NoSuchWorker(index));
        }
        step_region(&region).map_err(BrokerError::Turn)
    }

    async fn shutdown_all(&self) {}
}

/// Advance `world` by one generation across `pool`.
///
/// Returns only after every dispatch has completed. When several workers
/// fail, the error of the lowest worker index is reported.
///
/// # Errors
///
/// Returns [`BrokerError::Turn`] if the world cannot be partitioned or the
/// bands do not fit back together, and the pool's error if any worker
/// fails.
pub async fn advance<P: WorkerPool>(world: &World, pool: &P) -> Result<World, BrokerError> {
    let regions = regions(world).map_err(BrokerError::Turn)?;
    let dispatches = regions
        .into_iter()
        .enumerate()
        .map(|(index, region)| pool.compute(index, region));

    let computed = join_all(dispatches)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let field = reassemble(world.height, world.width, computed).map_err(BrokerError::Turn)?;
    Ok(world.with_field(field))
}
