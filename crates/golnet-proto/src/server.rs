//! RPC server: accept loop, per-connection dispatch, graceful stop.
//!
//! Each request is dispatched on its own task, so a long-running call (a
//! broker run) never blocks short calls (report, pause, quit) arriving on
//! the same or another connection. Responses are written as they complete
//! and matched to requests by id.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::RpcError;
use crate::frame::{RequestFrame, ResponseFrame, read_frame, write_frame};
use crate::methods::Method;

/// A service exposed over RPC.
///
/// Implementations route on the method identifier and return the encoded
/// response record; [`decode_params`] and [`encode_result`] do the typed
/// conversion.
pub trait Service: Send + Sync + 'static {
    /// Handle one request.
    fn dispatch(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RpcError>> + Send;
}

/// Decode the request record for method `M`.
///
/// A missing (`null`) payload is treated as an empty record.
///
/// # Errors
///
/// Returns [`RpcError::Codec`] if the payload has the wrong shape.
pub fn decode_params<M: Method>(params: Value) -> Result<M::Request, RpcError> {
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params
    };
    Ok(serde_json::from_value(params)?)
}

/// Encode a response record.
///
/// # Errors
///
/// Returns [`RpcError::Codec`] if encoding fails.
pub fn encode_result<T: Serialize>(response: &T) -> Result<Value, RpcError> {
    Ok(serde_json::to_value(response)?)
}

/// A bound listener ready to serve a [`Service`].
#[derive(Debug)]
pub struct RpcServer {
    listener: TcpListener,
}

impl RpcServer {
    /// Bind to `addr` (`host:port`; port 0 picks a free port).
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Io`] if the address cannot be bound.
    pub async fn bind(addr: &str) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// The bound address.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Io`] if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve `service` until `shutdown` turns `true` (or its sender drops).
    ///
    /// After the stop signal no new connections are accepted; open
    /// connections get `grace` to finish before they are aborted.
    ///
    /// # Errors
    ///
    /// Currently infallible once bound; accept failures are logged.
    pub async fn serve<S: Service>(
        self,
        service: Arc<S>,
        mut shutdown: watch::Receiver<bool>,
        grace: Duration,
    ) -> Result<(), RpcError> {
        let addr = self.local_addr()?;
        info!(%addr, "RPC server listening");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.wait_for(|stop| *stop) => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "connection accepted");
                        connections.spawn(serve_connection(stream, peer, Arc::clone(&service)));
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "connection task failed");
                    }
                }
            }
        }

        drop(self.listener);
        info!(
            %addr,
            open_connections = connections.len(),
            "RPC server stopped accepting connections"
        );
        if tokio::time::timeout(grace, drain(&mut connections))
            .await
            .is_err()
        {
            warn!(
                remaining = connections.len(),
                grace_ms = grace.as_millis(),
                "grace period elapsed, aborting open connections"
            );
            connections.abort_all();
        }
        Ok(())
    }
}

/// Wait for every task in `set` to finish.
async fn drain(set: &mut JoinSet<()>) {
    while set.join_next().await.is_some() {}
}

/// Collect tasks in `set` that have already finished, without waiting.
/// Returns how many were collected.
fn reap_finished(set: &mut JoinSet<()>, peer: SocketAddr) -> usize {
    let mut reaped: usize = 0;
    while let Some(finished) = set.try_join_next() {
        if let Err(e) = finished {
            warn!(%peer, error = %e, "request task failed");
        }
        reaped = reaped.saturating_add(1);
    }
    reaped
}

/// Read requests from one connection until it closes, dispatching each on
/// its own task and writing responses as they complete.
async fn serve_connection<S: Service>(stream: TcpStream, peer: SocketAddr, service: Arc<S>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, error = %e, "failed to set TCP_NODELAY");
    }
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let (tx, mut rx) = mpsc::unbounded_channel::<ResponseFrame>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write_frame(&mut write_half, &frame).await {
                debug!(%peer, error = %e, "failed to write response");
                break;
            }
        }
    });

    let mut requests = JoinSet::new();
    loop {
        reap_finished(&mut requests, peer);
        match read_frame::<_, RequestFrame>(&mut reader).await {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                let tx = tx.clone();
                requests.spawn(async move {
                    let RequestFrame { id, method, params } = request;
                    debug!(%peer, id, method, "dispatching request");
                    let frame = match service.dispatch(&method, params).await {
                        Ok(result) => ResponseFrame::success(id, result),
                        Err(e) => {
                            warn!(%peer, id, method, error = %e, "request failed");
                            ResponseFrame::failure(id, e.to_string())
                        }
                    };
                    // The writer only goes away if the peer hung up.
                    let _ = tx.send(frame);
                });
            }
            Ok(None) => break,
            Err(e) => {
                warn!(%peer, error = %e, "unreadable request, closing connection");
                let _ = tx.send(ResponseFrame::failure(0, e.to_string()));
                break;
            }
        }
    }

    drain(&mut requests).await;
    drop(tx);
    if let Err(e) = writer.await {
        debug!(%peer, error = %e, "response writer failed");
    }
    debug!(%peer, "connection closed");
}
