//! Wall-clock comparison of the strip engine across worker counts.
//!
//! Use with `--release` for meaningful results.

#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Instant;

use strip_life::striplife::{
    Grid, NullObserver, StripLife, StripLifeConfig, patterns, simulate_sequential,
};

const DENSITY: f64 = 0.42;
const SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn divisors_up_to(side: usize, cap: usize) -> Vec<usize> {
    (1..=side.min(cap)).filter(|w| side % w == 0).collect()
}

fn bench_sequential(initial: &Grid, generations: u64) -> (f64, Grid) {
    let mut grid = initial.clone();
    let start = Instant::now();
    simulate_sequential(&mut grid, generations, &mut NullObserver);
    (start.elapsed().as_secs_f64() * 1000.0, grid)
}

fn bench_strips(initial: &Grid, workers: usize, generations: u64) -> (f64, Grid) {
    let mut grid = initial.clone();
    let engine = StripLife::with_config(
        StripLifeConfig::default()
            .workers(workers)
            .generations(generations),
    );
    let start = Instant::now();
    if let Err(err) = engine.run(&mut grid, &mut NullObserver) {
        panic!("strip run failed with {workers} workers: {err}");
    }
    (start.elapsed().as_secs_f64() * 1000.0, grid)
}

fn main() {
    let scales: &[(usize, u64)] = &[(64, 500), (256, 200), (512, 100), (1024, 40)];
    let max_workers = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        * 2;

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>10} {:>8}",
        "Grid", "Workers", "Iters", "Total(ms)", "Avg(ms)", "Match"
    );
    println!("{}", "-".repeat(61));

    for &(side, iters) in scales {
        let initial = match patterns::random_soup(side, DENSITY, SEED) {
            Ok(grid) => grid,
            Err(err) => panic!("cannot seed {side}x{side}: {err}"),
        };
        let (seq_ms, reference) = bench_sequential(&initial, iters);
        println!(
            "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>8}",
            format!("{side}x{side}"),
            "seq",
            iters,
            seq_ms,
            seq_ms / iters as f64,
            "-"
        );

        for workers in divisors_up_to(side, max_workers) {
            let (total_ms, grid) = bench_strips(&initial, workers, iters);
            let status = if grid == reference { "MATCH" } else { "MISMATCH" };
            println!(
                "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>8}",
                format!("{side}x{side}"),
                workers,
                iters,
                total_ms,
                total_ms / iters as f64,
                status
            );
        }
    }
}
