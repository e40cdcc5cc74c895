//! Engine failure taxonomy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong inside the engine.
///
/// Bounds, dimension, partitioning, and exchange failures abort the run.
/// `SyncTimeout` is the one recoverable condition: it is logged as a
/// warning and the iteration proceeds with whatever work finished.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("cell ({x}, {y}) out of bounds for {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("cannot split {rows} rows across {units} units")]
    ResourceExhausted { rows: usize, units: usize },

    #[error(
        "iteration {iteration} timed out after {waited_secs}s: \
         {claimed}/{total} chunks claimed, {active} workers active"
    )]
    SyncTimeout {
        iteration: u32,
        claimed: usize,
        total: usize,
        active: usize,
        waited_secs: u64,
    },

    #[error("halo exchange with unit {unit} failed")]
    CommunicationFailure { unit: usize },

    #[error("cannot write {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
}
