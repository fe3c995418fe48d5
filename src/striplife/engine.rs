//! Strip-parallel step engine.
//!
//! The grid is cut into `W` vertical strips of width `C = S / W`. Each
//! worker owns one strip buffer for the whole run. Per generation it reads
//! the shared grid, writes its strip, and parks at the generation barrier;
//! the last arrival blits every strip back into the grid, bumps the
//! generation counter, and notifies the observer before releasing the
//! workers into the next generation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use super::barrier::{BarrierError, CyclicBarrier};
use super::error::{Result, StripLifeError, panic_message};
use super::grid::{Grid, Strip};
use super::kernel;
use super::observer::Observer;
use super::sync::{SendPtr, StripSlots};

pub const DEFAULT_SIDE: usize = 50;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_GENERATIONS: u64 = 100;

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

/// Largest divisor of `side` that does not exceed `cores`.
fn auto_worker_count_for(side: usize, cores: usize) -> usize {
    let cap = cores.clamp(1, side.max(1));
    (1..=cap).rev().find(|&w| side % w == 0).unwrap_or(1)
}

/// Check `side` and `workers` and return the strip width.
pub fn validate_partition(side: usize, workers: usize) -> Result<usize> {
    if side == 0 || workers == 0 {
        return Err(StripLifeError::InvalidSize { side, workers });
    }
    if side % workers != 0 {
        return Err(StripLifeError::InvalidPartition { side, workers });
    }
    Ok(side / workers)
}

/// Resolve the worker count from a config, falling back to auto-detect.
fn resolve_workers(config: &StripLifeConfig, side: usize) -> usize {
    config
        .workers
        .unwrap_or_else(|| auto_worker_count_for(side, physical_core_count()))
}

/// Cooperative stop signal checked by the merge action after every
/// generation. All workers leave the run after the same generation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Forces worker `worker` to panic right before computing its strip for the
/// given zero-based generation. Used to exercise failure propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultInjection {
    pub worker: usize,
    pub generation: u64,
}

/// Configuration for a StripLife run.
///
/// Use `StripLifeConfig::default()` for an auto-sized worker pool and
/// [`DEFAULT_GENERATIONS`] steps, or customise via the builder methods.
#[derive(Clone, Debug)]
pub struct StripLifeConfig {
    /// Number of strip workers; must divide the grid side.
    /// `None` means the largest divisor of the side not above the physical
    /// core count.
    pub workers: Option<usize>,
    pub generations: u64,
    pub cancel: Option<CancelToken>,
    pub fault: Option<FaultInjection>,
}

impl Default for StripLifeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            generations: DEFAULT_GENERATIONS,
            cancel: None,
            fault: None,
        }
    }
}

impl StripLifeConfig {
    /// Set an explicit worker count. Zero is rejected when the run starts.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn generations(mut self, g: u64) -> Self {
        self.generations = g;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn inject_fault(mut self, worker: usize, generation: u64) -> Self {
        self.fault = Some(FaultInjection { worker, generation });
        self
    }
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub side: usize,
    pub workers: usize,
    /// Generations merged into the grid.
    pub generations: u64,
    /// True when a [`CancelToken`] ended the run early.
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Copy every strip into its column range of the grid.
fn merge_strips(grid: &mut Grid, strips: &[Strip]) {
    for (index, strip) in strips.iter().enumerate() {
        grid.blit_strip(strip, index * strip.width());
    }
}

struct WorkerContext<'a, A> {
    barrier: &'a CyclicBarrier<A>,
    grid: SendPtr<Grid>,
    strips: StripSlots<Strip>,
    stop: &'a AtomicBool,
    width: usize,
    generations: u64,
    fault: Option<FaultInjection>,
}

fn run_worker<A: FnMut()>(index: usize, ctx: &WorkerContext<'_, A>) -> Result<()> {
    let first_column = index * ctx.width;
    log::debug!(
        "strip worker {index} started on columns [{first_column}, {})",
        first_column + ctx.width
    );

    for generation in 0..ctx.generations {
        let computed = panic::catch_unwind(AssertUnwindSafe(|| {
            if ctx
                .fault
                .is_some_and(|f| f.worker == index && f.generation == generation)
            {
                panic!("injected fault in worker {index} at generation {generation}");
            }
            // SAFETY: compute phase. The merge only runs once every worker is
            // parked, so the grid is read-only here, and slot `index` belongs
            // to this worker alone until it arrives at the barrier.
            let (grid, strip) = unsafe { (&*ctx.grid.get(), ctx.strips.slot_mut(index)) };
            kernel::advance_strip(grid, strip, first_column);
        }));
        if let Err(payload) = computed {
            ctx.barrier.break_barrier();
            let message = panic_message(payload.as_ref());
            log::error!("strip worker {index} aborted at generation {generation}: {message}");
            return Err(StripLifeError::WorkerAborted {
                worker: index,
                generation,
                message,
            });
        }

        match ctx.barrier.wait() {
            Ok(_) => {}
            Err(BarrierError::Broken) => {
                log::warn!("strip worker {index} found the barrier broken at generation {generation}");
                return Err(StripLifeError::BarrierBroken {
                    worker: index,
                    generation,
                });
            }
            Err(BarrierError::ActionPanicked(message)) => {
                log::error!("merge action aborted at generation {generation}: {message}");
                return Err(StripLifeError::WorkerAborted {
                    worker: index,
                    generation,
                    message,
                });
            }
        }

        if ctx.stop.load(Ordering::Acquire) {
            log::debug!("strip worker {index} stopping after generation {}", generation + 1);
            break;
        }
    }

    log::debug!("strip worker {index} finished");
    Ok(())
}

/// Barrier-synchronized strip-parallel Game of Life engine.
#[derive(Clone, Debug, Default)]
pub struct StripLife {
    config: StripLifeConfig,
}

impl StripLife {
    pub fn new() -> Self {
        Self::with_config(StripLifeConfig::default())
    }

    pub fn with_config(config: StripLifeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StripLifeConfig {
        &self.config
    }

    /// Advance `grid` by the configured number of generations, notifying
    /// `observer` after each merge with generation numbers starting at 1.
    ///
    /// On error the grid holds the last fully merged generation.
    pub fn run<O>(&self, grid: &mut Grid, observer: &mut O) -> Result<RunReport>
    where
        O: Observer + Send + ?Sized,
    {
        let side = grid.side();
        let workers = resolve_workers(&self.config, side);
        let width = validate_partition(side, workers)?;
        let generations = self.config.generations;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strip-worker-{i}"))
            .build()?;

        log::info!(
            "running {generations} generations on a {side}x{side} grid with {workers} strips of width {width}"
        );

        let mut strips: Vec<Strip> = (0..workers).map(|_| Strip::new(side, width)).collect();
        let slots = StripSlots::new(&mut strips);
        debug_assert_eq!(slots.len(), workers);
        let grid_ptr = SendPtr::new(grid as *mut Grid);
        let stop = AtomicBool::new(false);
        let cancel = self.config.cancel.as_ref();
        let mut merged = 0u64;

        let start = Instant::now();
        let mut outcomes: Vec<Result<()>> = (0..workers).map(|_| Ok(())).collect();
        {
            let barrier = CyclicBarrier::new(workers, || {
                // SAFETY: merge phase. Runs on the last arrival while every
                // other worker is parked, so no strip or grid reference is live.
                let (grid, strips) = unsafe { (&mut *grid_ptr.get(), slots.all()) };
                merge_strips(grid, strips);
                merged += 1;
                observer.observe(grid, merged);
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    stop.store(true, Ordering::Release);
                }
            });
            let ctx = WorkerContext {
                barrier: &barrier,
                grid: grid_ptr,
                strips: slots,
                stop: &stop,
                width,
                generations,
                fault: self.config.fault,
            };
            let ctx = &ctx;

            pool.scope(|s| {
                for (index, outcome) in outcomes.iter_mut().enumerate() {
                    s.spawn(move |_| *outcome = run_worker(index, ctx));
                }
            });
        }
        let elapsed = start.elapsed();

        if let Some(err) = outcomes
            .into_iter()
            .filter_map(Result::err)
            .min_by_key(StripLifeError::severity_rank)
        {
            log::error!("run failed after {merged} generations: {err}");
            return Err(err);
        }

        let cancelled = stop.into_inner();
        if cancelled {
            log::warn!("run cancelled after {merged} of {generations} generations");
        }
        log::info!(
            "completed {merged} generations in {:.3} ms",
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(RunReport {
            side,
            workers,
            generations: merged,
            cancelled,
            elapsed,
        })
    }
}

/// Run `generations` parallel generations on `grid` with `workers` strips.
pub fn run_parallel<O>(
    grid: &mut Grid,
    workers: usize,
    generations: u64,
    observer: &mut O,
) -> Result<RunReport>
where
    O: Observer + Send + ?Sized,
{
    StripLife::with_config(
        StripLifeConfig::default()
            .workers(workers)
            .generations(generations),
    )
    .run(grid, observer)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        CancelToken, StripLife, StripLifeConfig, auto_worker_count_for, merge_strips,
        run_parallel, validate_partition,
    };
    use crate::striplife::error::StripLifeError;
    use crate::striplife::grid::{Grid, Strip};
    use crate::striplife::kernel::{advance_strip, step_sequential};
    use crate::striplife::observer::NullObserver;
    use crate::striplife::patterns;

    #[test]
    fn auto_worker_count_picks_largest_divisor_within_cores() {
        assert_eq!(auto_worker_count_for(50, 8), 5);
        assert_eq!(auto_worker_count_for(50, 10), 10);
        assert_eq!(auto_worker_count_for(50, 64), 50);
        assert_eq!(auto_worker_count_for(7, 4), 1);
        assert_eq!(auto_worker_count_for(12, 0), 1);
        assert_eq!(auto_worker_count_for(1, 16), 1);
    }

    #[test]
    fn validate_partition_rejects_bad_shapes() {
        assert_eq!(validate_partition(50, 10).unwrap(), 5);
        assert!(matches!(
            validate_partition(0, 1),
            Err(StripLifeError::InvalidSize { side: 0, workers: 1 })
        ));
        assert!(matches!(
            validate_partition(50, 0),
            Err(StripLifeError::InvalidSize { .. })
        ));
        assert!(matches!(
            validate_partition(50, 3),
            Err(StripLifeError::InvalidPartition { side: 50, workers: 3 })
        ));
    }

    #[test]
    fn merged_strips_equal_sequential_step() {
        let grid = patterns::random_soup(12, 0.4, 0x51_7219).unwrap();
        let mut strips: Vec<Strip> = (0..4).map(|_| Strip::new(12, 3)).collect();
        for (index, strip) in strips.iter_mut().enumerate() {
            advance_strip(&grid, strip, index * 3);
        }
        let mut merged = grid.clone();
        merge_strips(&mut merged, &strips);
        assert_eq!(merged, step_sequential(&grid));
    }

    #[test]
    fn invalid_partition_fails_before_observing() {
        let mut grid = Grid::new(10).unwrap();
        let mut calls = 0u32;
        let err = run_parallel(&mut grid, 3, 5, &mut |_: &Grid, _: u64| calls += 1).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(calls, 0);
    }

    #[test]
    fn zero_generations_leave_grid_untouched() {
        let mut grid = patterns::middle_line(10).unwrap();
        let before = grid.clone();
        let report = run_parallel(&mut grid, 5, 0, &mut NullObserver).unwrap();
        assert_eq!(report.generations, 0);
        assert!(!report.cancelled);
        assert_eq!(grid, before);
    }

    #[test]
    fn observer_sees_consecutive_generations() {
        let mut grid = patterns::middle_line(20).unwrap();
        let mut seen = Vec::new();
        let report = run_parallel(&mut grid, 4, 6, &mut |_: &Grid, generation: u64| {
            seen.push(generation)
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(report.generations, 6);
        assert_eq!(report.workers, 4);
        assert_eq!(report.side, 20);
    }

    #[test]
    fn observer_runs_on_a_strip_worker_thread() {
        let mut grid = Grid::new(6).unwrap();
        let mut names = HashSet::new();
        run_parallel(&mut grid, 3, 4, &mut |_: &Grid, _: u64| {
            let name = std::thread::current().name().map(str::to_owned);
            names.insert(name.unwrap_or_default());
        })
        .unwrap();
        assert!(!names.is_empty());
        assert!(names.iter().all(|name| name.starts_with("strip-worker-")));
    }

    #[test]
    fn cancel_stops_all_workers_after_same_generation() {
        let token = CancelToken::new();
        let engine = StripLife::with_config(
            StripLifeConfig::default()
                .workers(5)
                .generations(50)
                .cancel_token(token.clone()),
        );
        let initial = patterns::random_soup(20, 0.35, 0xCA_4CE1).unwrap();
        let mut grid = initial.clone();
        let mut observer = |_: &Grid, generation: u64| {
            if generation == 7 {
                token.cancel();
            }
        };
        let report = engine.run(&mut grid, &mut observer).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.generations, 7);
        let mut expected = initial;
        for _ in 0..7 {
            expected = step_sequential(&expected);
        }
        assert_eq!(grid, expected);
    }

    #[test]
    fn default_engine_auto_sizes_workers() {
        let engine = StripLife::with_config(StripLifeConfig::default().generations(2));
        let mut grid = patterns::middle_line(24).unwrap();
        let report = engine.run(&mut grid, &mut NullObserver).unwrap();
        assert!(report.workers >= 1);
        assert_eq!(24 % report.workers, 0);
        assert_eq!(report.generations, 2);
    }
}
