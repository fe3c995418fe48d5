//! Initial grid builders.

use rand::{Rng, SeedableRng};

use super::error::Result;
use super::grid::Grid;

/// Reference starting pattern: row `side / 2`, columns
/// `[side / 2 - 25, side / 2 + 25)` clipped to the grid, all alive.
/// For `side <= 50` this is the whole middle row.
pub fn middle_line(side: usize) -> Result<Grid> {
    let row = side / 2;
    let first = row.saturating_sub(25);
    let end = (row + 25).min(side);
    Grid::from_fn(side, |x, y| x == row && (first..end).contains(&y))
}

/// Grid with exactly the listed cells alive. Coordinates outside the grid
/// are ignored.
pub fn from_cells(side: usize, cells: &[(usize, usize)]) -> Result<Grid> {
    let mut grid = Grid::new(side)?;
    for &(x, y) in cells {
        if x < side && y < side {
            grid.set(x, y, true);
        }
    }
    Ok(grid)
}

/// Seeded random soup where each cell is alive with probability `density`.
pub fn random_soup(side: usize, density: f64, seed: u64) -> Result<Grid> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let density = density.clamp(0.0, 1.0);
    Grid::from_fn(side, |_, _| rng.random::<f64>() < density)
}

#[cfg(test)]
mod tests {
    use super::{from_cells, middle_line, random_soup};

    #[test]
    fn middle_line_fills_row_of_reference_grid() {
        let grid = middle_line(50).unwrap();
        assert_eq!(grid.population(), 50);
        assert!(grid.row(25).iter().all(|&alive| alive));
        assert!(grid.row(24).iter().all(|&alive| !alive));
    }

    #[test]
    fn middle_line_is_clipped_on_large_grids() {
        let grid = middle_line(100).unwrap();
        assert_eq!(grid.population(), 50);
        assert!(!grid.get(50, 24));
        assert!(grid.get(50, 25));
        assert!(grid.get(50, 74));
        assert!(!grid.get(50, 75));
    }

    #[test]
    fn from_cells_skips_out_of_range() {
        let grid = from_cells(3, &[(0, 0), (2, 2), (3, 0), (0, 9)]).unwrap();
        assert_eq!(grid.live_cells(), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn random_soup_is_reproducible() {
        let a = random_soup(16, 0.4, 0xC0FFEE).unwrap();
        let b = random_soup(16, 0.4, 0xC0FFEE).unwrap();
        assert_eq!(a, b);
        assert!(random_soup(16, 0.0, 1).unwrap().is_empty());
        assert_eq!(random_soup(16, 1.0, 1).unwrap().population(), 256);
    }
}
