//! Game of Life rule application over a single region.
//!
//! Vertical wraparound is already resolved by the halo rows the broker
//! ships with each region; horizontal wraparound is resolved here because
//! regions carry no halo columns. The next generation is written into a
//! freshly allocated band, never into the input rows.

use crate::error::GridError;
use crate::grid::{Cell, Grid};
use crate::partition::region_for;
use crate::world::{Region, World};

/// Next state of a cell given its current state and alive-neighbour count.
///
/// Exactly three neighbours: alive. Exactly two: unchanged. Anything else:
/// dead.
pub const fn next_state(alive: bool, neighbours: u8) -> bool {
    match neighbours {
        3 => true,
        2 => alive,
        _ => false,
    }
}

/// Count alive neighbours of column `x` in `row`, given the rows above and
/// below it. Columns wrap modulo the row width.
fn live_neighbours(above: &[Cell], row: &[Cell], below: &[Cell], x: usize) -> u8 {
    let width = row.len();
    let left = x.checked_sub(1).unwrap_or_else(|| width.saturating_sub(1));
    let right = if x.saturating_add(1) >= width {
        0
    } else {
        x.saturating_add(1)
    };
    let columns = [left, x, right];

    let mut count: u8 = 0;
    for (dy, line) in [above, row, below].into_iter().enumerate() {
        for (dx, &column) in columns.iter().enumerate() {
            if dy == 1 && dx == 1 {
                continue;
            }
            if line.get(column).is_some_and(|cell| cell.alive) {
                count = count.saturating_add(1);
            }
        }
    }
    count
}

/// Apply one generation to a region.
///
/// The input holds `height + 2` rows (halo included); the output holds the
/// `height` recomputed band rows, with cell coordinates in grid space.
///
/// # Errors
///
/// Returns [`GridError::MalformedRegion`] if the region's rows disagree
/// with its declared shape.
pub fn step_region(region: &Region) -> Result<Region, GridError> {
    region.validate_input()?;

    let mut band = Vec::with_capacity(region.height);
    for (offset, window) in region.field.windows(3).enumerate() {
        let [above, row, below] = window else {
            continue;
        };
        let y = region.start.saturating_add(offset);
        let next_row = row
            .iter()
            .enumerate()
            .map(|(x, cell)| {
                let neighbours = live_neighbours(above, row, below, x);
                Cell::new(x, y, next_state(cell.alive, neighbours))
            })
            .collect();
        band.push(next_row);
    }

    Ok(Region {
        field: band,
        start: region.start,
        end: region.end,
        height: region.height,
        width: region.width,
    })
}

/// Apply one generation to a whole grid as a single undivided region.
///
/// This is the non-distributed reference the partitioned computation must
/// agree with.
///
/// # Errors
///
/// Returns a [`GridError`] if the grid is empty.
pub fn step_grid(grid: &Grid) -> Result<Grid, GridError> {
    let world = World::new(grid.clone(), 1);
    let region = region_for(&world, 0)?;
    let next = step_region(&region)?;
    Grid::from_rows(next.field, grid.width())
}
