//! Helpers shared by the client's unit tests.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use golnet_broker::{Broker, LocalWorkerPool};
use golnet_proto::{RpcClient, RpcServer};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::ClientConfig;

/// A broker over an in-process pool, served on an ephemeral port.
pub struct LocalBroker {
    pub addr: String,
    pub client: RpcClient,
}

impl LocalBroker {
    pub async fn start(workers: usize) -> Self {
        let server = RpcServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap().to_string();
        let (stop_tx, stop_rx) = watch::channel(false);
        let broker = Arc::new(Broker::new(LocalWorkerPool::new(workers), stop_tx));
        tokio::spawn(server.serve(broker, stop_rx, Duration::from_millis(100)));
        Self {
            client: RpcClient::new(addr.clone()),
            addr,
        }
    }
}

/// A fresh directory path under the system temp dir. Not created.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("golnet-client-{}", Uuid::new_v4()))
}

pub fn client_config(broker_addr: &str, out_dir: PathBuf, width: usize, height: usize) -> ClientConfig {
    ClientConfig {
        broker_addr: broker_addr.to_owned(),
        turns: 1,
        image_width: width,
        image_height: height,
        workers: 1,
        images_dir: out_dir.join("images"),
        out_dir,
        report_interval: Duration::from_secs(3600),
    }
}
