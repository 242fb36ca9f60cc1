//! Error types for the client driver.

use std::path::PathBuf;

use golnet_proto::RpcError;

/// Errors that can occur while driving a run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// A grid and an image raster cannot be converted into each other.
    #[error("invalid PGM image: {0}")]
    Image(String),

    /// The image could not be decoded or encoded.
    #[error("PGM codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// The image does not have the configured dimensions.
    #[error("{path} is {actual_width}x{actual_height}, expected {width}x{height}")]
    ImageSize {
        /// Image file.
        path: PathBuf,
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
        /// Width found in the file.
        actual_width: usize,
        /// Height found in the file.
        actual_height: usize,
    },

    /// A broker call failed.
    #[error("broker call failed: {0}")]
    Rpc(#[from] RpcError),
}
