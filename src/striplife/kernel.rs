//! B3/S23 rule kernel with a dead-edge neighborhood.
//!
//! Neighbors outside `[0, S)²` do not exist: they are skipped by a bounds
//! check before indexing, never read as dead cells from a padded border.

use super::grid::{Grid, Strip};
use super::observer::Observer;

/// The eight Moore-neighborhood offsets as `(dx, dy)`.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Birth on 3, survival on 2 or 3.
#[inline(always)]
pub fn rule(alive: bool, live_neighbors: u8) -> bool {
    if alive {
        live_neighbors == 2 || live_neighbors == 3
    } else {
        live_neighbors == 3
    }
}

/// Number of live in-bounds neighbors of `(x, y)`.
#[inline]
pub fn live_neighbors(grid: &Grid, x: usize, y: usize) -> u8 {
    let side = grid.side();
    let mut count = 0u8;
    for (dx, dy) in NEIGHBOR_OFFSETS {
        let Some(nx) = x.checked_add_signed(dx).filter(|&nx| nx < side) else {
            continue;
        };
        let Some(ny) = y.checked_add_signed(dy).filter(|&ny| ny < side) else {
            continue;
        };
        count += grid.get(nx, ny) as u8;
    }
    count
}

/// Next state of the cell at `(x, y)`.
#[inline]
pub fn next_cell_state(grid: &Grid, x: usize, y: usize) -> bool {
    rule(grid.get(x, y), live_neighbors(grid, x, y))
}

/// Compute the next state of grid columns `[first_column, first_column + strip.width())`
/// into `strip`. Every strip cell is overwritten.
pub fn advance_strip(grid: &Grid, strip: &mut Strip, first_column: usize) {
    debug_assert_eq!(strip.height(), grid.side());
    debug_assert!(first_column + strip.width() <= grid.side());
    for (x, row) in strip.rows_mut().enumerate() {
        for (local_y, cell) in row.iter_mut().enumerate() {
            *cell = next_cell_state(grid, x, first_column + local_y);
        }
    }
}

/// Single-threaded whole-grid step.
pub fn step_sequential(grid: &Grid) -> Grid {
    let side = grid.side();
    let mut next = grid.clone();
    for x in 0..side {
        for y in 0..side {
            next.set(x, y, next_cell_state(grid, x, y));
        }
    }
    next
}

/// Advance `grid` by `generations` single-threaded steps, notifying the
/// observer after each with generation numbers `1..=generations`.
pub fn simulate_sequential<O: Observer + ?Sized>(
    grid: &mut Grid,
    generations: u64,
    observer: &mut O,
) {
    for generation in 1..=generations {
        *grid = step_sequential(grid);
        observer.observe(grid, generation);
    }
}
