//! Square cell grid and the vertical strips workers compute into.
//!
//! Both containers are row-major `Vec<bool>`: row `x` of a grid is the
//! contiguous slice `[x * side, (x + 1) * side)`, and row `x` of a strip is
//! `[x * width, (x + 1) * width)`. Merging a strip is therefore one
//! `copy_from_slice` per row.

use super::error::{Result, StripLifeError};

/// An `S × S` grid of cells, indexed `(x, y)` with `x` the row and `y` the
/// column.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    side: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// All-dead grid with the given side.
    pub fn new(side: usize) -> Result<Self> {
        if side == 0 {
            return Err(StripLifeError::InvalidSize { side, workers: 1 });
        }
        Ok(Self {
            side,
            cells: vec![false; side * side],
        })
    }

    /// Build a grid by evaluating `init(x, y)` for every cell.
    pub fn from_fn<F: FnMut(usize, usize) -> bool>(side: usize, mut init: F) -> Result<Self> {
        let mut grid = Self::new(side)?;
        for x in 0..side {
            let row = &mut grid.cells[x * side..(x + 1) * side];
            for (y, cell) in row.iter_mut().enumerate() {
                *cell = init(x, y);
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Cell state at `(x, y)`. Panics when out of bounds.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.side && y < self.side);
        self.cells[x * self.side + y]
    }

    /// Cell state at `(x, y)`, or `None` when the coordinate lies outside.
    #[inline]
    pub fn try_get(&self, x: usize, y: usize) -> Option<bool> {
        (x < self.side && y < self.side).then(|| self.cells[x * self.side + y])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        debug_assert!(x < self.side && y < self.side);
        self.cells[x * self.side + y] = alive;
    }

    #[inline]
    pub fn row(&self, x: usize) -> &[bool] {
        &self.cells[x * self.side..(x + 1) * self.side]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.cells.chunks_exact(self.side)
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&alive| alive).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.contains(&true)
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        for (x, row) in self.rows().enumerate() {
            for (y, &alive) in row.iter().enumerate() {
                if alive {
                    f(x, y);
                }
            }
        }
    }

    /// Live cells in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.for_each_live(|x, y| out.push((x, y)));
        out
    }

    /// Copy `strip` into grid columns `[first_column, first_column + strip.width())`,
    /// one contiguous row segment at a time.
    pub fn blit_strip(&mut self, strip: &Strip, first_column: usize) {
        debug_assert_eq!(strip.height(), self.side);
        debug_assert!(first_column + strip.width() <= self.side);
        let side = self.side;
        let width = strip.width();
        for (x, src) in strip.rows().enumerate() {
            let start = x * side + first_column;
            self.cells[start..start + width].copy_from_slice(src);
        }
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grid {}x{} (population {})", self.side, self.side, self.population())?;
        for row in self.rows() {
            for &alive in row {
                f.write_str(if alive { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A vertical `S × C` slice of the grid owned by one worker between barriers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strip {
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl Strip {
    /// Zero-initialized strip.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![false; height * width],
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[x * self.width + y]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[x * self.width + y] = alive;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.cells.chunks_exact(self.width)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [bool]> + '_ {
        self.cells.chunks_exact_mut(self.width)
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }
}
