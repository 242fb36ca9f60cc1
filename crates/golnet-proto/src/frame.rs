//! Request/response frames and newline-delimited framing.
//!
//! A frame is one JSON document followed by `\n`. Requests carry an `id`
//! that the matching response echoes, so several calls may share one
//! connection and complete out of order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RpcError;

/// Largest frame accepted from a peer, in bytes.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// A method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Caller-chosen id echoed by the response.
    pub id: u64,
    /// Method identifier, e.g. `Broker.Report`.
    pub method: String,
    /// Encoded request record.
    #[serde(default)]
    pub params: Value,
}

/// The outcome of a method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Id of the request being answered (0 if the request was unreadable).
    pub id: u64,
    /// Encoded response record on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseFrame {
    /// A successful response.
    pub const fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// A failed response.
    pub const fn failure(id: u64, message: String) -> Self {
        Self {
            id,
            result: None,
            error: Some(message),
        }
    }

    /// Decode the result into `T`, or surface the remote error.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Remote`] if the peer reported an error,
    /// [`RpcError::EmptyResponse`] if the frame carried nothing, and
    /// [`RpcError::Codec`] if the result has the wrong shape.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, RpcError> {
        if let Some(message) = self.error {
            return Err(RpcError::Remote(message));
        }
        let value = self.result.ok_or(RpcError::EmptyResponse(self.id))?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Encode `frame` as one line and write it.
///
/// A frame the peer would refuse is not sent.
///
/// # Errors
///
/// Returns [`RpcError::FrameTooLarge`] past [`MAX_FRAME_BYTES`],
/// [`RpcError::Codec`] or [`RpcError::Io`].
pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(frame)?;
    bytes.push(b'\n');
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(RpcError::FrameTooLarge {
            limit: MAX_FRAME_BYTES,
        });
    }
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `Ok(None)` on a clean end of stream.
///
/// Blank lines between frames are skipped.
///
/// # Errors
///
/// Returns [`RpcError::FrameTooLarge`] past [`MAX_FRAME_BYTES`],
/// [`RpcError::ConnectionClosed`] if the stream ends mid-frame, and
/// [`RpcError::Codec`] if the line is not a valid frame.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, RpcError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = Vec::new();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if line.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            return Err(RpcError::ConnectionClosed);
        }

        let newline = available.iter().position(|&byte| byte == b'\n');
        let take = newline.map_or(available.len(), |pos| pos.saturating_add(1));
        let (chunk, _) = available.split_at(take);
        line.extend_from_slice(chunk);
        reader.consume(take);

        if line.len() > MAX_FRAME_BYTES {
            return Err(RpcError::FrameTooLarge {
                limit: MAX_FRAME_BYTES,
            });
        }
        if newline.is_some() {
            if line.iter().all(u8::is_ascii_whitespace) {
                line.clear();
                continue;
            }
            break;
        }
    }
    Ok(Some(serde_json::from_slice(&line)?))
}
