//! PGM images as Game of Life grids, read and written with `image`.
//!
//! A pixel of 255 is an alive cell; any other value is dead. Written
//! images use maxval 255 with alive cells at 255 and dead cells at 0.

use std::path::Path;

use anyhow::Context;
use golnet_types::Grid;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{GrayImage, ImageFormat, Luma};

use crate::error::ClientError;

/// Pixel value of an alive cell.
const ALIVE: u8 = 255;
/// Pixel value of a dead cell.
const DEAD: u8 = 0;

/// Decode a PGM image into a grid.
///
/// Pixels are read as 8-bit grey; wider samples are scaled down first.
///
/// # Errors
///
/// Returns [`ClientError::Codec`] if the bytes are not a readable PNM image.
pub fn decode(bytes: &[u8]) -> Result<Grid, ClientError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)?.to_luma8();
    let width = usize::try_from(image.width())
        .map_err(|e| ClientError::Image(format!("width {}: {e}", image.width())))?;
    let height = usize::try_from(image.height())
        .map_err(|e| ClientError::Image(format!("height {}: {e}", image.height())))?;

    let mut grid = Grid::new(height, width);
    for (y, row) in image.rows().enumerate() {
        for (x, &Luma([value])) in row.enumerate() {
            grid.set_alive(x, y, value == ALIVE);
        }
    }
    Ok(grid)
}

/// Encode a grid as a binary (`P5`) PGM image.
///
/// # Errors
///
/// Returns [`ClientError::Image`] if the grid is too large for the format
/// and [`ClientError::Codec`] if encoding fails.
pub fn encode(grid: &Grid) -> Result<Vec<u8>, ClientError> {
    let width = u32::try_from(grid.width())
        .map_err(|e| ClientError::Image(format!("width {}: {e}", grid.width())))?;
    let height = u32::try_from(grid.height())
        .map_err(|e| ClientError::Image(format!("height {}: {e}", grid.height())))?;
    let pixels = grid
        .rows()
        .iter()
        .flatten()
        .map(|cell| if cell.alive { ALIVE } else { DEAD })
        .collect();
    let image = GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| ClientError::Image(format!("{width}x{height} raster does not fit")))?;

    let mut bytes = Vec::new();
    image.write_with_encoder(
        PnmEncoder::new(&mut bytes).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary)),
    )?;
    Ok(bytes)
}

/// Read and decode the image at `path`.
pub async fn read_file(path: &Path) -> anyhow::Result<Grid> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    decode(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

/// Encode `grid` and write it to `path`, creating parent directories.
pub async fn write_file(path: &Path, grid: &Grid) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let bytes = encode(grid).with_context(|| format!("failed to encode {}", path.display()))?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Image file stem for a `width` x `height` world, e.g. `512x512`.
pub fn input_stem(width: usize, height: usize) -> String {
    format!("{width}x{height}")
}

/// Image file stem for a checkpoint after `turns` turns, e.g. `512x512x100`.
pub fn output_stem(width: usize, height: usize, turns: u64) -> String {
    format!("{width}x{height}x{turns}")
}
