//! Error types for the `golnet-types` crate.
//!
//! All fallible grid, partitioning, and rule operations return
//! [`GridError`]. Every variant describes a programming or configuration
//! error rather than a transient condition, so callers never retry them.

/// Errors raised by grid construction, partitioning, and rule application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The matrix does not have the declared number of rows.
    #[error("expected {expected} rows, found {actual}")]
    RowCount {
        /// Declared row count.
        expected: usize,
        /// Rows actually present.
        actual: usize,
    },

    /// A row does not have the declared number of cells.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowWidth {
        /// Index of the offending row.
        row: usize,
        /// Declared width.
        expected: usize,
        /// Cells actually present.
        actual: usize,
    },

    /// A world declares dimensions that differ from its grid.
    #[error("world declares {declared_height}x{declared_width} but its grid is {height}x{width}")]
    DimensionMismatch {
        /// Height declared on the world.
        declared_height: usize,
        /// Width declared on the world.
        declared_width: usize,
        /// Height of the grid.
        height: usize,
        /// Width of the grid.
        width: usize,
    },

    /// The worker count cannot partition the grid height.
    #[error("cannot partition {height} rows across {workers} workers")]
    InvalidWorkerCount {
        /// Requested worker count.
        workers: usize,
        /// Grid height.
        height: usize,
    },

    /// A worker index outside `[0, workers)` was requested.
    #[error("worker index {index} out of range for {workers} workers")]
    WorkerIndex {
        /// Requested index.
        index: usize,
        /// Worker count.
        workers: usize,
    },

    /// A region's declared shape is inconsistent with its rows.
    #[error("malformed region [{start}, {end}): {reason}")]
    MalformedRegion {
        /// First band row in grid coordinates.
        start: usize,
        /// One past the last band row in grid coordinates.
        end: usize,
        /// Human-readable description of the inconsistency.
        reason: String,
    },

    /// A computed band does not fit the slot it is reassembled into.
    #[error("band {worker} covers [{start}, {end}) but slot [{expected_start}, {expected_end}) was expected")]
    BandMismatch {
        /// Worker index of the band.
        worker: usize,
        /// Start row the band reported.
        start: usize,
        /// End row the band reported.
        end: usize,
        /// Start row expected at this position.
        expected_start: usize,
        /// End row expected at this position.
        expected_end: usize,
    },
}
