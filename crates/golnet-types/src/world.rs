//! Simulation state exchanged between client, broker, and workers.
//!
//! A [`World`] is the authoritative full-grid state; a [`Region`] is the
//! short-lived unit of work cut from it for one worker and one turn.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::{Cell, Grid};

/// Number of halo rows on each side of a region's band.
pub const HALO_ROWS: usize = 1;

/// Full simulation state: the grid plus the worker count to partition across.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    /// The cell grid.
    pub field: Grid,
    /// Declared number of rows.
    pub height: usize,
    /// Declared number of columns.
    pub width: usize,
    /// Number of workers the broker should partition across.
    pub workers: usize,
}

impl World {
    /// Create a world whose declared dimensions match `field`.
    pub const fn new(field: Grid, workers: usize) -> Self {
        Self {
            height: field.height(),
            width: field.width(),
            field,
            workers,
        }
    }

    /// Create the successor world holding `field`, keeping the worker count.
    pub const fn with_field(&self, field: Grid) -> Self {
        Self::new(field, self.workers)
    }

    /// Check that the declared dimensions agree with the grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] on disagreement.
    pub const fn validate(&self) -> Result<(), GridError> {
        if self.height != self.field.height() || self.width != self.field.width() {
            return Err(GridError::DimensionMismatch {
                declared_height: self.height,
                declared_width: self.width,
                height: self.field.height(),
                width: self.field.width(),
            });
        }
        Ok(())
    }

    /// Check that the worker count yields bands of at least one row.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidWorkerCount`] if `workers` is zero or
    /// exceeds the height.
    pub const fn validate_workers(&self) -> Result<(), GridError> {
        if self.workers == 0 || self.workers > self.height {
            return Err(GridError::InvalidWorkerCount {
                workers: self.workers,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Number of alive cells in the grid.
    pub fn alive_count(&self) -> usize {
        self.field.alive_count()
    }

    /// Every alive cell with its position.
    pub fn alive_cells(&self) -> Vec<Cell> {
        self.field.alive_cells()
    }
}

/// A worker's unit of work: a row band plus one halo row above and below.
///
/// On the way to a worker `field` holds `height + 2` rows (halo above,
/// band, halo below). On the way back it holds only the `height`
/// recomputed band rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Row data, with or without halo rows depending on direction.
    ///
    /// Cells decoded from the wire carry positions relative to `field`.
    #[serde(with = "crate::wire::rows")]
    pub field: Vec<Vec<Cell>>,
    /// First band row, in grid coordinates.
    pub start: usize,
    /// One past the last band row, in grid coordinates.
    pub end: usize,
    /// Number of band rows (`end - start`).
    pub height: usize,
    /// Number of cells per row.
    pub width: usize,
}

impl Region {
    /// Check the shape of a region about to be computed (halo included).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MalformedRegion`] describing the first problem.
    pub fn validate_input(&self) -> Result<(), GridError> {
        let expected_rows = self.height.saturating_add(HALO_ROWS.saturating_mul(2));
        self.validate_rows(expected_rows)
    }

    /// Check the shape of a computed region (band rows only).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MalformedRegion`] describing the first problem.
    pub fn validate_output(&self) -> Result<(), GridError> {
        self.validate_rows(self.height)
    }

    fn validate_rows(&self, expected_rows: usize) -> Result<(), GridError> {
        let malformed = |reason: String| GridError::MalformedRegion {
            start: self.start,
            end: self.end,
            reason,
        };
        if self.height == 0 || self.width == 0 {
            return Err(malformed(format!(
                "empty band ({} rows of {} cells)",
                self.height, self.width
            )));
        }
        if self.end.checked_sub(self.start) != Some(self.height) {
            return Err(malformed(format!(
                "declared height {} does not span the band",
                self.height
            )));
        }
        if self.field.len() != expected_rows {
            return Err(malformed(format!(
                "{} rows supplied, {expected_rows} expected",
                self.field.len()
            )));
        }
        if let Some((row, cells)) = self
            .field
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != self.width)
        {
            return Err(malformed(format!(
                "row {row} has {} cells, {} expected",
                cells.len(),
                self.width
            )));
        }
        Ok(())
    }
}
