//! Per-generation observers and the reference text renderer.

use std::io::{self, Write};

use super::grid::Grid;

/// Width of the separator line written after each rendered grid.
pub const SEPARATOR_WIDTH: usize = 39;

/// Sink notified with every merged generation, in order.
///
/// Runs on the thread that completed the barrier while all workers are
/// parked, so a slow observer stalls the whole simulation.
pub trait Observer {
    fn observe(&mut self, grid: &Grid, generation: u64);
}

impl<F: FnMut(&Grid, u64)> Observer for F {
    #[inline]
    fn observe(&mut self, grid: &Grid, generation: u64) {
        self(grid, generation)
    }
}

/// Observer that ignores every generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    #[inline]
    fn observe(&mut self, _grid: &Grid, _generation: u64) {}
}

/// Write `STEP <n>`, then the grid as rows of `1 `/`0 ` tokens, then the
/// dashed separator.
pub fn write_grid<W: Write + ?Sized>(out: &mut W, grid: &Grid, generation: u64) -> io::Result<()> {
    write_header(out, generation)?;
    let mut line = String::with_capacity(grid.side() * 2 + 1);
    for row in grid.rows() {
        line.clear();
        for &alive in row {
            line.push_str(if alive { "1 " } else { "0 " });
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

fn write_header<W: Write + ?Sized>(out: &mut W, generation: u64) -> io::Result<()> {
    writeln!(out, "STEP {generation}")
}

/// Text observer printing grids to any writer.
pub struct ConsoleObserver<W: Write> {
    out: W,
    every: u64,
    cells: bool,
    error: Option<io::Error>,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            every: 1,
            cells: true,
            error: None,
        }
    }

    /// Print only generations divisible by `n`.
    pub fn every(mut self, n: u64) -> Self {
        self.every = n.max(1);
        self
    }

    /// When false, print only the `STEP` header lines.
    pub fn cells(mut self, enabled: bool) -> Self {
        self.cells = enabled;
        self
    }

    /// First I/O error hit while printing, if any. Output stops after it.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, grid: &Grid, generation: u64) -> io::Result<()> {
        if self.cells {
            write_grid(&mut self.out, grid, generation)?;
        } else {
            write_header(&mut self.out, generation)?;
        }
        self.out.flush()
    }
}

impl<W: Write> Observer for ConsoleObserver<W> {
    fn observe(&mut self, grid: &Grid, generation: u64) {
        if self.error.is_some() || generation % self.every != 0 {
            return;
        }
        if let Err(err) = self.render(grid, generation) {
            log::error!("grid output failed at generation {generation}: {err}");
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{ConsoleObserver, Observer, write_grid};
    use crate::striplife::grid::Grid;

    #[test]
    fn write_grid_uses_reference_layout() {
        let grid = Grid::from_fn(2, |x, y| x == 0 && y == 1).unwrap();
        let mut out = Vec::new();
        write_grid(&mut out, &grid, 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        let expected = format!("STEP 3\n0 1 \n0 0 \n{}\n", "-".repeat(39));
        assert_eq!(text, expected);
    }

    #[test]
    fn console_observer_samples_and_can_skip_cells() {
        let grid = Grid::new(2).unwrap();
        let mut observer = ConsoleObserver::new(Vec::new()).every(2).cells(false);
        for generation in 0..5 {
            observer.observe(&grid, generation);
        }
        let text = String::from_utf8(observer.into_inner()).unwrap();
        assert_eq!(text, "STEP 0\nSTEP 2\nSTEP 4\n");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_observer_keeps_first_error() {
        let grid = Grid::new(1).unwrap();
        let mut observer = ConsoleObserver::new(FailingWriter);
        observer.observe(&grid, 0);
        observer.observe(&grid, 1);
        let err = observer.take_error().expect("write error recorded");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(observer.take_error().is_none());
    }

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        let grid = Grid::new(1).unwrap();
        {
            let mut record = |_: &Grid, generation: u64| seen.push(generation);
            record.observe(&grid, 1);
            record.observe(&grid, 2);
        }
        assert_eq!(seen, vec![1, 2]);
    }
}
