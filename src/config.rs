use std::path::PathBuf;
use std::time::Duration;

/// Worker threads used when neither the CLI nor the settings file says
pub const DEFAULT_WORKERS: usize = 4;
/// Iteration cap for a run
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;
/// Rows in the smallest scheduler chunk
pub const DEFAULT_BASE_CHUNK: usize = 64;
/// Seconds the controller waits on iteration completion per wake
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// File the final world is written to unless suppressed
pub const DEFAULT_OUTPUT: &str = "final_world000.txt";

/// Parallel execution models available
#[derive(Clone, Copy, PartialEq)]
pub enum EngineModel {
    Pool, // shared grid, workers pull row chunks from one queue
    Halo, // private rows per unit, boundary rows sent over channels
}

/// How the initial world is populated
#[derive(Clone, Copy)]
pub enum InitPattern {
    /// Built-in 4x6 verification world
    TestWorld,
    /// Both diagonals alive on a sized grid
    Cross { width: usize, height: usize },
    /// Each cell alive with probability `density` on a sized grid
    Random {
        width: usize,
        height: usize,
        density: f64,
    },
}

/// Configuration for one engine run
#[derive(Clone)]
pub struct EngineConfig {
    pub model: EngineModel,
    pub pattern: InitPattern,
    pub workers: usize,
    pub max_iterations: u32,
    pub base_chunk: usize,
    pub sync_timeout: Duration,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: EngineModel::Pool,
            pattern: InitPattern::TestWorld,
            workers: DEFAULT_WORKERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            base_chunk: DEFAULT_BASE_CHUNK,
            sync_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            seed: None,
            output: Some(PathBuf::from(DEFAULT_OUTPUT)),
            verbose: false,
        }
    }
}
