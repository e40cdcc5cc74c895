mod config;
mod engine;
mod error;
mod grid;
mod output;
mod partition;
mod rule;
mod settings;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::warn;

use config::{
    EngineConfig, EngineModel, InitPattern, DEFAULT_BASE_CHUNK, DEFAULT_MAX_ITERATIONS,
    DEFAULT_OUTPUT, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};
use settings::Settings;

#[derive(Parser)]
#[command(name = "parlife")]
#[command(author = "Parallel Life Engine")]
#[command(version = "0.2.0")]
#[command(
    about = "Parallel Game of Life engine: domain decomposition, halo exchange, adaptive scheduling",
    long_about = None
)]
struct Cli {
    /// Grid width in cells (omit both dimensions for the built-in test world)
    #[arg(requires = "height")]
    width: Option<usize>,

    /// Grid height in cells
    height: Option<usize>,

    /// Execution model: pool (shared-memory workers) or halo (message-passing units)
    #[arg(short, long, default_value = "pool")]
    model: String,

    /// Worker threads (pool) or partition units (halo)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Iteration cap
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Rows in the smallest scheduler chunk (pool model)
    #[arg(long)]
    base_chunk: Option<usize>,

    /// Seconds to wait on iteration completion before continuing with a warning
    #[arg(long)]
    timeout: Option<u64>,

    /// Fill sized grids randomly with this live-cell probability instead of the diagonal cross
    #[arg(short, long)]
    density: Option<f64>,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Final world file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip writing the final world file
    #[arg(long, conflicts_with = "output")]
    no_output: bool,

    /// Print the initial and final worlds and raise log verbosity
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let settings = Settings::load();
    let config = resolve_config(&cli, &settings);

    if let Err(err) = engine::run(&config) {
        eprintln!("parlife: {err}");
        std::process::exit(1);
    }
}

/// Merges the command line over the settings file over the built-in
/// defaults.
fn resolve_config(cli: &Cli, settings: &Settings) -> EngineConfig {
    let model = match cli.model.to_lowercase().as_str() {
        "pool" | "shared" => EngineModel::Pool,
        "halo" | "units" | "message" => EngineModel::Halo,
        _ => {
            eprintln!("Unknown model: {}. Using pool.", cli.model);
            eprintln!("Available: pool, halo");
            EngineModel::Pool
        }
    };

    let pattern = match (cli.width, cli.height) {
        (Some(width), Some(height)) => match cli.density {
            Some(density) if !density.is_finite() => {
                warn!("invalid density {density}, using the diagonal cross");
                InitPattern::Cross { width, height }
            }
            Some(density) => InitPattern::Random {
                width,
                height,
                density,
            },
            None => InitPattern::Cross { width, height },
        },
        _ => {
            if cli.density.is_some() {
                warn!("--density has no effect without grid dimensions");
            }
            InitPattern::TestWorld
        }
    };

    let workers = match cli.workers.or(settings.engine.workers) {
        Some(0) => {
            warn!("invalid worker count 0, using the default of {DEFAULT_WORKERS}");
            DEFAULT_WORKERS
        }
        Some(n) => n,
        None => DEFAULT_WORKERS,
    };
    let hw_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if workers > hw_threads {
        warn!("{workers} workers exceed the {hw_threads} available hardware threads");
    }

    let base_chunk = match cli.base_chunk.or(settings.engine.base_chunk) {
        Some(0) => {
            warn!("invalid chunk size 0, using the default of {DEFAULT_BASE_CHUNK}");
            DEFAULT_BASE_CHUNK
        }
        Some(n) => n,
        None => DEFAULT_BASE_CHUNK,
    };

    let timeout_secs = match cli.timeout.or(settings.engine.timeout_secs) {
        Some(0) => {
            warn!("invalid timeout 0s, using the default of {DEFAULT_TIMEOUT_SECS}s");
            DEFAULT_TIMEOUT_SECS
        }
        Some(n) => n,
        None => DEFAULT_TIMEOUT_SECS,
    };

    let output = if cli.no_output {
        None
    } else {
        Some(
            cli.output
                .clone()
                .or_else(|| settings.engine.output.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        )
    };

    EngineConfig {
        model,
        pattern,
        workers,
        max_iterations: cli.max_iterations,
        base_chunk,
        sync_timeout: Duration::from_secs(timeout_secs),
        seed: cli.seed,
        output,
        verbose: cli.verbose,
    }
}
