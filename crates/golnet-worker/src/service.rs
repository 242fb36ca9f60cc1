//! The worker's RPC service.
//!
//! [`WorkerService`] answers `Worker.ComputeRegion` and `Worker.Shutdown`.
//! It keeps no state between compute calls; the only thing it owns is the
//! stop signal for its own server.

use golnet_proto::methods::{
    ComputeRegionRequest, ComputeRegionResponse, WorkerComputeRegion, WorkerShutdown,
    WorkerShutdownResponse, names,
};
use golnet_proto::{RpcError, Service, decode_params, encode_result};
use golnet_types::step_region;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::WorkerError;

/// Stateless compute endpoint.
#[derive(Debug)]
pub struct WorkerService {
    shutdown: watch::Sender<bool>,
}

impl WorkerService {
    /// Create a service that signals `shutdown` when asked to stop.
    pub const fn new(shutdown: watch::Sender<bool>) -> Self {
        Self { shutdown }
    }

    /// Apply one generation to the band of `request.region`.
    ///
    /// The rule runs on the blocking pool so a large region does not hold
    /// up the accept loop.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Grid`] if the region is malformed and
    /// [`WorkerError::Join`] if the compute task dies.
    pub async fn compute_region(
        &self,
        request: ComputeRegionRequest,
    ) -> Result<ComputeRegionResponse, WorkerError> {
        let region = request.region;
        region.validate_input()?;
        let (start, end, width) = (region.start, region.end, region.width);

        let computed = tokio::task::spawn_blocking(move || step_region(&region)).await??;

        debug!(start, end, width, "region computed");
        Ok(ComputeRegionResponse { region: computed })
    }

    /// Stop this worker's server once in-flight responses are written.
    pub fn shutdown(&self) -> WorkerShutdownResponse {
        info!("shutdown requested");
        self.shutdown.send_replace(true);
        WorkerShutdownResponse {}
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Service for WorkerService {
    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            names::WORKER_COMPUTE_REGION => {
                let request = decode_params::<WorkerComputeRegion>(params)?;
                let response = self
                    .compute_region(request)
                    .await
                    .map_err(RpcError::handler)?;
                encode_result(&response)
            }
            names::WORKER_SHUTDOWN => {
                let _ = decode_params::<WorkerShutdown>(params)?;
                encode_result(&self.shutdown())
            }
            other => Err(RpcError::UnknownMethod(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use golnet_types::{Grid, World, region_for};

    use super::*;

    fn service() -> (WorkerService, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (WorkerService::new(tx), rx)
    }

    #[tokio::test]
    async fn computes_band_without_halo() {
        let (service, _rx) = service();
        // Horizontal blinker in row 2 of a 5x5 grid.
        let grid = Grid::from_alive(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let world = World::new(grid, 1);
        let region = region_for(&world, 0).unwrap();

        let response = service
            .compute_region(ComputeRegionRequest { region })
            .await
            .unwrap();
        let out = response.region;
        assert_eq!(out.field.len(), 5);
        let alive: Vec<(usize, usize)> = out
            .field
            .iter()
            .flatten()
            .filter(|c| c.alive)
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(alive, vec![(2, 1), (2, 2), (2, 3)]);
    }

    #[tokio::test]
    async fn malformed_region_is_rejected() {
        let (service, _rx) = service();
        let world = World::new(Grid::new(4, 4), 2);
        let mut region = region_for(&world, 1).unwrap();
        region.field.pop();

        let result = service
            .compute_region(ComputeRegionRequest { region })
            .await;
        assert!(matches!(result, Err(WorkerError::Grid(_))));
    }

    #[test]
    fn shutdown_flips_the_signal() {
        let (service, rx) = service();
        assert!(!service.is_shutting_down());
        let _ = service.shutdown();
        assert!(*rx.borrow());
        assert!(service.is_shutting_down());
    }

    #[tokio::test]
    async fn dispatch_rejects_broker_methods() {
        let (service, _rx) = service();
        let result = service.dispatch(names::BROKER_RUN, Value::Null).await;
        assert!(matches!(result, Err(RpcError::UnknownMethod(name)) if name == "Broker.Run"));
    }
}
