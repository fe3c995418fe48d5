#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::Instant;

use strip_life::striplife::{
    ConsoleObserver, DEFAULT_GENERATIONS, DEFAULT_SIDE, DEFAULT_WORKERS, Grid, Observer,
    StripLife, StripLifeConfig, patterns,
};

const USAGE: &str = "usage: strip-life [--size N] [--workers N] [--generations N] \
[--every N] [--quiet] [--seed N] [--density D]";
const DEFAULT_DENSITY: f64 = 0.42;

struct MainArgs {
    side: usize,
    config: StripLifeConfig,
    every: u64,
    cells: bool,
    seed: Option<u64>,
    density: f64,
}

fn parse_value<T: std::str::FromStr>(value: Option<String>, flag: &str) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{flag} requires a value"))?;
    value
        .parse()
        .map_err(|_| format!("{flag}: invalid value {value:?}"))
}

fn parse_args() -> Result<MainArgs, String> {
    let mut side = DEFAULT_SIDE;
    let mut config = StripLifeConfig::default()
        .workers(DEFAULT_WORKERS)
        .generations(DEFAULT_GENERATIONS);
    let mut every = 1;
    let mut cells = true;
    let mut seed = None;
    let mut density = DEFAULT_DENSITY;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--size" => side = parse_value(args.next(), "--size")?,
            "--workers" => config = config.workers(parse_value(args.next(), "--workers")?),
            "--generations" => {
                config = config.generations(parse_value(args.next(), "--generations")?);
            }
            "--every" => every = parse_value(args.next(), "--every")?,
            "--quiet" => cells = false,
            "--seed" => seed = Some(parse_value(args.next(), "--seed")?),
            "--density" => density = parse_value(args.next(), "--density")?,
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(MainArgs {
        side,
        config,
        every,
        cells,
        seed,
        density,
    })
}

fn initial_grid(args: &MainArgs) -> strip_life::striplife::Result<Grid> {
    match args.seed {
        Some(seed) => patterns::random_soup(args.side, args.density, seed),
        None => patterns::middle_line(args.side),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let mut grid = match initial_grid(&args) {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let mut observer = ConsoleObserver::stdout().every(args.every).cells(args.cells);
    observer.observe(&grid, 0);

    let engine = StripLife::with_config(args.config);
    let start = Instant::now();
    let outcome = engine.run(&mut grid, &mut observer);
    let duration = start.elapsed();
    println!("Duration: {}", duration.as_millis());

    match outcome {
        Ok(report) => {
            log::info!(
                "final population {} after {} generations",
                grid.population(),
                report.generations
            );
        }
        Err(err) => {
            eprintln!("error: {err}");
            return if err.is_configuration() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            };
        }
    }

    if let Some(err) = observer.take_error() {
        eprintln!("error: failed to write output: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
