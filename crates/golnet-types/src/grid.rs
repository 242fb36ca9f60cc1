//! Cells and the toroidal cell matrix.
//!
//! A [`Grid`] is always rectangular: every constructor (including
//! deserialization) checks that each row holds exactly `width` cells and
//! that there are exactly `height` rows. Cell coordinates are rewritten
//! from array position on construction, so the `(x, y)` carried by a
//! [`Cell`] is a transport convenience that always agrees with where the
//! cell sits.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A single simulation cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
    /// Whether the cell is alive.
    pub alive: bool,
}

impl Cell {
    /// Create a cell at `(x, y)`.
    pub const fn new(x: usize, y: usize, alive: bool) -> Self {
        Self { x, y, alive }
    }

    /// Create a dead cell at `(x, y)`.
    pub const fn dead(x: usize, y: usize) -> Self {
        Self::new(x, y, false)
    }
}

/// Rectangular matrix of cells whose edges wrap around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    /// Rows of cells, `height` rows of `width` cells each.
    #[serde(with = "crate::wire::rows")]
    data: Vec<Vec<Cell>>,
    /// Number of rows.
    height: usize,
    /// Number of cells per row.
    width: usize,
}

/// Unchecked wire shape of a [`Grid`].
#[derive(Deserialize)]
struct RawGrid {
    #[serde(with = "crate::wire::rows")]
    data: Vec<Vec<Cell>>,
    height: usize,
    width: usize,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        if raw.data.len() != raw.height {
            return Err(GridError::RowCount {
                expected: raw.height,
                actual: raw.data.len(),
            });
        }
        Self::from_rows(raw.data, raw.width)
    }
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(height: usize, width: usize) -> Self {
        let data = (0..height)
            .map(|y| (0..width).map(|x| Cell::dead(x, y)).collect())
            .collect();
        Self {
            data,
            height,
            width,
        }
    }

    /// Build a grid from rows, validating that each row has `width` cells.
    ///
    /// The height is taken from the number of rows. Cell coordinates are
    /// rewritten to match their position.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::RowWidth`] for the first row of the wrong length.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>, width: usize) -> Result<Self, GridError> {
        for (y, row) in rows.iter_mut().enumerate() {
            if row.len() != width {
                return Err(GridError::RowWidth {
                    row: y,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (x, cell) in row.iter_mut().enumerate() {
                cell.x = x;
                cell.y = y;
            }
        }
        Ok(Self {
            height: rows.len(),
            data: rows,
            width,
        })
    }

    /// Create a grid with the given `(x, y)` positions alive.
    ///
    /// Positions outside the grid are ignored.
    pub fn from_alive(height: usize, width: usize, alive: &[(usize, usize)]) -> Self {
        let mut grid = Self::new(height, width);
        for &(x, y) in alive {
            grid.set_alive(x, y, true);
        }
        grid
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of cells per row.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.data
    }

    /// A single row, if `y` is in range.
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        self.data.get(y).map(Vec::as_slice)
    }

    /// Look up the cell at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        self.data.get(y).and_then(|row| row.get(x))
    }

    /// Whether the cell at `(x, y)` is alive. Out-of-range positions are dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some_and(|cell| cell.alive)
    }

    /// Set the state of the cell at `(x, y)`.
    ///
    /// Returns `false` if the position is outside the grid.
    pub fn set_alive(&mut self, x: usize, y: usize, alive: bool) -> bool {
        match self.data.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell) => {
                cell.alive = alive;
                true
            }
            None => false,
        }
    }

    /// Every alive cell, in row-major order, with its position.
    pub fn alive_cells(&self) -> Vec<Cell> {
        self.data
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.alive)
                    .map(move |(x, _)| Cell::new(x, y, true))
            })
            .collect()
    }

    /// Number of alive cells.
    pub fn alive_count(&self) -> usize {
        self.data
            .iter()
            .map(|row| row.iter().filter(|cell| cell.alive).count())
            .sum()
    }
}
