//! Row-band partitioning, halo construction, and reassembly.
//!
//! A grid of `height` rows is split across `workers` contiguous bands of
//! `height / workers` rows each; the last band absorbs the remainder. Each
//! band is shipped with the row directly above and directly below it,
//! wrapping around the top and bottom edges, so a worker can count
//! neighbours for its edge rows without seeing the rest of the grid.

use crate::error::GridError;
use crate::grid::Grid;
use crate::world::{Region, World};

/// Row range owned by one worker, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Worker index.
    pub worker: usize,
    /// First row of the band.
    pub start: usize,
    /// One past the last row of the band.
    pub end: usize,
}

impl Band {
    /// Compute the band for worker `index` of `workers` over `height` rows.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidWorkerCount`] if `workers` is zero or
    /// greater than `height`, and [`GridError::WorkerIndex`] if `index` is
    /// not below `workers`.
    pub fn new(height: usize, workers: usize, index: usize) -> Result<Self, GridError> {
        let band_height = height
            .checked_div(workers)
            .filter(|&rows| rows > 0)
            .ok_or(GridError::InvalidWorkerCount { workers, height })?;
        if index >= workers {
            return Err(GridError::WorkerIndex { index, workers });
        }
        let start = index.saturating_mul(band_height);
        let end = if index.saturating_add(1) == workers {
            height
        } else {
            start.saturating_add(band_height)
        };
        Ok(Self {
            worker: index,
            start,
            end,
        })
    }

    /// Number of rows in the band.
    pub const fn height(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Row directly above the band, wrapping to the bottom row.
    pub const fn halo_above(&self, grid_height: usize) -> usize {
        match self.start.checked_sub(1) {
            Some(row) => row,
            None => grid_height.saturating_sub(1),
        }
    }

    /// Row directly below the band, wrapping to the top row.
    pub const fn halo_below(&self, grid_height: usize) -> usize {
        if self.end >= grid_height { 0 } else { self.end }
    }
}

/// Compute every band for `workers` over `height` rows, in worker order.
///
/// # Errors
///
/// Returns [`GridError::InvalidWorkerCount`] for an unusable worker count.
pub fn bands(height: usize, workers: usize) -> Result<Vec<Band>, GridError> {
    if workers == 0 {
        return Err(GridError::InvalidWorkerCount { workers, height });
    }
    (0..workers)
        .map(|index| Band::new(height, workers, index))
        .collect()
}

/// Cut the region for worker `index` out of `world`.
///
/// The region's rows are `[halo above, band rows..., halo below]`.
///
/// # Errors
///
/// Returns a [`GridError`] if the world's worker count is unusable, the
/// index is out of range, or the grid is shorter than declared.
pub fn region_for(world: &World, index: usize) -> Result<Region, GridError> {
    let band = Band::new(world.height, world.workers, index)?;
    let rows = world.field.rows();
    let missing = |row: usize| GridError::RowCount {
        expected: world.height,
        actual: row,
    };

    let above = world
        .field
        .row(band.halo_above(world.height))
        .ok_or_else(|| missing(rows.len()))?;
    let below = world
        .field
        .row(band.halo_below(world.height))
        .ok_or_else(|| missing(rows.len()))?;
    let body = rows
        .get(band.start..band.end)
        .ok_or_else(|| missing(rows.len()))?;

    let mut field = Vec::with_capacity(band.height().saturating_add(2));
    field.push(above.to_vec());
    field.extend(body.iter().cloned());
    field.push(below.to_vec());

    Ok(Region {
        field,
        start: band.start,
        end: band.end,
        height: band.height(),
        width: world.width,
    })
}

/// Cut one region per worker, in worker-index order.
///
/// # Errors
///
/// Returns a [`GridError`] under the same conditions as [`region_for`].
pub fn regions(world: &World) -> Result<Vec<Region>, GridError> {
    world.validate_workers()?;
    (0..world.workers)
        .map(|index| region_for(world, index))
        .collect()
}

/// Concatenate computed bands back into a full grid.
///
/// `computed` must be in worker-index order; each band must cover exactly
/// the slot the partitioning assigned to that index.
///
/// # Errors
///
/// Returns [`GridError::BandMismatch`] if a band is out of order or the
/// wrong size, and shape errors if a band's rows are malformed.
pub fn reassemble(
    height: usize,
    width: usize,
    computed: Vec<Region>,
) -> Result<Grid, GridError> {
    let slots = bands(height, computed.len())?;
    let mut rows = Vec::with_capacity(height);
    for (slot, region) in slots.iter().zip(computed) {
        if region.start != slot.start || region.end != slot.end {
            return Err(GridError::BandMismatch {
                worker: slot.worker,
                start: region.start,
                end: region.end,
                expected_start: slot.start,
                expected_end: slot.end,
            });
        }
        region.validate_output()?;
        rows.extend(region.field);
    }
    Grid::from_rows(rows, width)
}
