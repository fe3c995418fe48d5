//! Strip-parallel Conway's Game of Life (B3/S23) on a fixed square grid with
//! dead edges, synchronized by a cyclic barrier after every generation.

pub mod striplife;
pub use striplife::{Grid, Observer, StripLife, StripLifeConfig, StripLifeError, run_parallel};
