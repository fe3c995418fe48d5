//! StripLife engine internals and public API.

mod barrier;
mod engine;
mod error;
mod grid;
mod kernel;
mod observer;
pub mod patterns;
mod sync;

pub use barrier::{BarrierError, BarrierWaitResult, CyclicBarrier};
pub use engine::{
    CancelToken, DEFAULT_GENERATIONS, DEFAULT_SIDE, DEFAULT_WORKERS, FaultInjection, RunReport,
    StripLife, StripLifeConfig, run_parallel, validate_partition,
};
pub use error::{Result, StripLifeError};
pub use grid::{Grid, Strip};
pub use kernel::{
    NEIGHBOR_OFFSETS, advance_strip, live_neighbors, next_cell_state, rule, simulate_sequential,
    step_sequential,
};
pub use observer::{ConsoleObserver, NullObserver, Observer, SEPARATOR_WIDTH, write_grid};
