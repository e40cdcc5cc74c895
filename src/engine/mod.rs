//! Simulation engine
//!
//! Each execution model is its own module with a `run()` function; this
//! module owns what they share: world construction, the stopping
//! predicate, and the reporting around a run.

pub mod halo;
pub mod pool;
pub mod tasks;

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{EngineConfig, EngineModel, InitPattern};
use crate::error::EngineError;
use crate::grid::Grid;
use crate::output;

/// A run grows out once the population reaches this multiple of the start
pub const GROWTH_FACTOR: u64 = 50;
/// A run dies out once the population falls to this fraction of the start
pub const COLLAPSE_DIVISOR: u64 = 50;

/// Whether another iteration should run.
///
/// Integer division means a starting population below 50 collapses the
/// lower bound to zero, so such runs stop only on extinction or the
/// iteration cap. A start of zero fails the growth test outright and no
/// update ever runs.
#[inline]
pub fn keep_running(iteration: u32, count: u64, initial: u64, max_iterations: u32) -> bool {
    iteration < max_iterations
        && count < initial.saturating_mul(GROWTH_FACTOR)
        && count > initial / COLLAPSE_DIVISOR
}

/// What a finished run did.
pub struct RunOutcome {
    pub iterations: u32,
    pub populations: Vec<u64>,
    pub timed_out: bool,
}

/// Builds the world, runs the selected model, and writes the final grid.
///
/// The per-iteration `iter = .., population count = ..` lines on stdout
/// are the progress contract; diagnostics go through the log facade.
pub fn run(config: &EngineConfig) -> Result<RunOutcome, EngineError> {
    let grid = build_grid(config)?;
    let initial = grid.population();
    println!(
        "Initial world, population count: {initial}, using {} workers",
        config.workers
    );
    if config.verbose {
        print!("{}", output::render_rows(&grid));
    }

    let outcome = match config.model {
        EngineModel::Pool => pool::run(&grid, config),
        EngineModel::Halo => halo::run(&grid, config)?,
    };
    debug!(
        "run ended after {} iterations, final population {}",
        outcome.iterations,
        outcome.populations.last().copied().unwrap_or(initial)
    );
    if outcome.timed_out {
        warn!("one or more iterations hit the sync timeout");
    }

    if config.verbose {
        print!("{}", output::render_rows(&grid));
    }
    if let Some(path) = &config.output {
        output::write_final_grid(&grid, path)?;
    }
    Ok(outcome)
}

fn build_grid(config: &EngineConfig) -> Result<Grid, EngineError> {
    match config.pattern {
        InitPattern::TestWorld => {
            println!("Test on a small 4x6 world");
            Ok(Grid::test_pattern())
        }
        InitPattern::Cross { width, height } => Grid::diagonal_cross(width, height),
        InitPattern::Random {
            width,
            height,
            density,
        } => {
            let seed = config.seed.unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0) // fallback for misconfigured system clocks
            });
            let mut rng = StdRng::seed_from_u64(seed);
            Grid::random(width, height, density, &mut rng)
        }
    }
}
