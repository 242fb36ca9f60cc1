//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;
use crate::pgm;

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Broker address (`host:port`).
    pub broker_addr: String,
    /// Turns to run.
    pub turns: u64,
    /// Image width in cells.
    pub image_width: usize,
    /// Image height in cells.
    pub image_height: usize,
    /// Workers the broker should partition across.
    pub workers: usize,
    /// Directory holding input images.
    pub images_dir: PathBuf,
    /// Directory receiving checkpoints and the final image.
    pub out_dir: PathBuf,
    /// Interval between progress reports.
    pub report_interval: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `GOLNET_BROKER_ADDR` -- broker address (default `127.0.0.1:8030`)
    /// - `GOLNET_TURNS` -- turns to run (default 100)
    /// - `GOLNET_IMAGE_WIDTH` / `GOLNET_IMAGE_HEIGHT` -- image size (default 512)
    /// - `GOLNET_WORKERS` -- worker count (default 1)
    /// - `GOLNET_IMAGES_DIR` -- input directory (default `images`)
    /// - `GOLNET_OUT_DIR` -- output directory (default `out`)
    /// - `GOLNET_REPORT_INTERVAL_MS` -- report period (default 2000)
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let report_interval_ms: u64 = parsed(&lookup, "GOLNET_REPORT_INTERVAL_MS", 2000)?;
        if report_interval_ms == 0 {
            return Err(ClientError::Config(
                "invalid GOLNET_REPORT_INTERVAL_MS: must be positive".to_owned(),
            ));
        }
        Ok(Self {
            broker_addr: lookup("GOLNET_BROKER_ADDR")
                .unwrap_or_else(|| "127.0.0.1:8030".to_owned()),
            turns: parsed(&lookup, "GOLNET_TURNS", 100)?,
            image_width: parsed(&lookup, "GOLNET_IMAGE_WIDTH", 512)?,
            image_height: parsed(&lookup, "GOLNET_IMAGE_HEIGHT", 512)?,
            workers: parsed(&lookup, "GOLNET_WORKERS", 1)?,
            images_dir: lookup("GOLNET_IMAGES_DIR")
                .map_or_else(|| PathBuf::from("images"), PathBuf::from),
            out_dir: lookup("GOLNET_OUT_DIR").map_or_else(|| PathBuf::from("out"), PathBuf::from),
            report_interval: Duration::from_millis(report_interval_ms),
        })
    }

    /// Path of the input image, `{images_dir}/{width}x{height}.pgm`.
    pub fn input_path(&self) -> PathBuf {
        self.images_dir
            .join(pgm::input_stem(self.image_width, self.image_height))
            .with_extension("pgm")
    }

    /// Path of a checkpoint, `{out_dir}/{width}x{height}x{turns}.pgm`.
    pub fn output_path(&self, turns: u64) -> PathBuf {
        self.out_dir
            .join(pgm::output_stem(self.image_width, self.image_height, turns))
            .with_extension("pgm")
    }
}

/// Parse variable `name`, falling back to `default` when unset.
fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid {name}: {e}")))
    })
}
