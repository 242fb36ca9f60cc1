//! RPC client: one TCP connection per call.
//!
//! Every call dials the peer, writes a single request frame, reads the
//! matching response, and closes the connection. There is no timeout: a
//! peer that never answers stalls the call.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::RpcError;
use crate::frame::{RequestFrame, ResponseFrame, read_frame, write_frame};
use crate::methods::Method;

/// Source of request ids, unique within the process.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Client for a single remote service address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcClient {
    addr: String,
}

impl RpcClient {
    /// Create a client for `addr` (`host:port`). No connection is made yet.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The remote address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Invoke method `M` with `request` and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Connect`] if the peer is unreachable,
    /// [`RpcError::Remote`] if the handler failed or the server rejected
    /// the request frame, and transport or codec errors otherwise.
    pub async fn call<M: Method>(&self, request: &M::Request) -> Result<M::Response, RpcError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| RpcError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        let (read_half, mut write_half) = stream.into_split();

        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let frame = RequestFrame {
            id,
            method: M::NAME.to_owned(),
            params: serde_json::to_value(request)?,
        };
        debug!(addr = %self.addr, id, method = M::NAME, "sending request");
        write_frame(&mut write_half, &frame).await?;

        let mut reader = BufReader::new(read_half);
        let response: ResponseFrame = read_frame(&mut reader)
            .await?
            .ok_or(RpcError::ConnectionClosed)?;
        // Id 0 answers a request the server could not read.
        if response.id == 0 && response.error.is_some() {
            return response.into_result();
        }
        if response.id != id {
            return Err(RpcError::UnexpectedId {
                expected: id,
                actual: response.id,
            });
        }
        response.into_result()
    }
}
