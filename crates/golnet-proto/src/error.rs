//! Error types for the RPC layer.
//!
//! [`RpcError`] covers both sides of a call: transport and codec failures,
//! and the error string a remote handler sent back.

/// Errors raised while making or serving an RPC call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The TCP connection to the peer could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame or payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// An incoming frame exceeded the size limit.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The peer closed the connection before a complete response arrived.
    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    /// The response did not answer the request that was sent.
    #[error("response id {actual} does not match request id {expected}")]
    UnexpectedId {
        /// Id of the request.
        expected: u64,
        /// Id carried by the response.
        actual: u64,
    },

    /// The response frame carried neither a result nor an error.
    #[error("response {0} carried neither a result nor an error")]
    EmptyResponse(u64),

    /// The server does not expose the requested method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A local handler rejected the request.
    #[error("{0}")]
    Handler(String),

    /// The remote handler returned an error.
    #[error("remote error: {0}")]
    Remote(String),
}

impl RpcError {
    /// Wrap any displayable handler failure.
    pub fn handler(err: impl std::fmt::Display) -> Self {
        Self::Handler(err.to_string())
    }
}
