//! Shared-memory worker pool.
//!
//! A fixed set of workers shares one grid and one chunk queue behind a
//! mutex. The controller publishes a fresh queue each iteration and waits,
//! bounded, on an "all done" signal; workers wait on "work ready" and pull
//! chunks until the queue drains. A chunk, once claimed, always runs to
//! completion, and no two chunks overlap, so workers never write the same
//! next-buffer row.

use std::sync::{Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::engine::tasks::{plan_chunks, Chunk};
use crate::engine::{keep_running, RunOutcome};
use crate::error::EngineError;
use crate::grid::Grid;
use crate::rule::step_row;

struct PoolState {
    chunks: Vec<Chunk>,
    cursor: usize,
    active: usize,
    epoch: u64,
    population: u64,
    shutdown: bool,
}

struct WorkPool {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    all_done: Condvar,
}

// A poisoned lock means a worker panicked while holding it; the queue
// state itself is still structurally sound.
fn relock<T>(result: Result<T, PoisonError<T>>) -> T {
    result.unwrap_or_else(PoisonError::into_inner)
}

/// Runs the simulation on a pool of `config.workers` threads.
///
/// The final state is left in the grid's current buffer. Iteration
/// timeouts are logged and survived; everything else about the pool is
/// infallible once the grid exists.
pub fn run(grid: &Grid, config: &EngineConfig) -> RunOutcome {
    let initial = grid.population();
    let pool = WorkPool {
        state: Mutex::new(PoolState {
            chunks: Vec::new(),
            cursor: 0,
            active: 0,
            epoch: 0,
            population: 0,
            shutdown: false,
        }),
        work_ready: Condvar::new(),
        all_done: Condvar::new(),
    };
    let pool = &pool;

    thread::scope(|scope| {
        for id in 0..config.workers {
            scope.spawn(move || worker(pool, grid, id));
        }

        let mut iteration = 0u32;
        let mut count = initial;
        let mut populations = Vec::new();
        let mut timed_out = false;

        while keep_running(iteration, count, initial, config.max_iterations) {
            let chunks = plan_chunks(grid.height(), iteration, config.base_chunk);
            let total = chunks.len();
            {
                let mut state = relock(pool.state.lock());
                state.chunks = chunks;
                state.cursor = 0;
                state.active = 0;
                state.epoch += 1;
                state.population = 0;
                pool.work_ready.notify_all();
            }
            debug!("iteration {iteration}: dispatched {total} chunks");

            let (population, hit_timeout) =
                wait_for_iteration(pool, iteration, total, config.sync_timeout);
            grid.swap_buffers();
            // after a timeout the per-chunk sum is partial; recount the
            // merged world instead
            count = if hit_timeout {
                timed_out = true;
                grid.population()
            } else {
                population
            };
            println!("iter = {iteration}, population count = {count}");
            populations.push(count);
            iteration += 1;
        }

        let mut state = relock(pool.state.lock());
        state.shutdown = true;
        pool.work_ready.notify_all();
        drop(state);

        RunOutcome {
            iterations: iteration,
            populations,
            timed_out,
        }
    })
}

/// Blocks until every chunk of the current dispatch is claimed and
/// finished, or until one bounded wait elapses with no progress signal.
fn wait_for_iteration(
    pool: &WorkPool,
    iteration: u32,
    total: usize,
    timeout: Duration,
) -> (u64, bool) {
    let mut state = relock(pool.state.lock());
    loop {
        if state.cursor >= state.chunks.len() && state.active == 0 {
            return (state.population, false);
        }
        let (next, wait) = relock(pool.all_done.wait_timeout(state, timeout));
        state = next;
        if wait.timed_out() {
            let err = EngineError::SyncTimeout {
                iteration,
                claimed: state.cursor,
                total,
                active: state.active,
                waited_secs: timeout.as_secs(),
            };
            warn!("{err}");
            return (state.population, true);
        }
    }
}

fn worker(pool: &WorkPool, grid: &Grid, id: usize) {
    let width = grid.width();
    let mut above = vec![0u8; width];
    let mut row = vec![0u8; width];
    let mut below = vec![0u8; width];
    let mut out = vec![0u8; width];

    loop {
        let (chunk, epoch) = {
            let mut state = relock(pool.state.lock());
            loop {
                if state.shutdown {
                    return;
                }
                if state.cursor < state.chunks.len() {
                    break;
                }
                state = relock(pool.work_ready.wait(state));
            }
            let chunk = state.chunks[state.cursor];
            state.cursor += 1;
            state.active += 1;
            (chunk, state.epoch)
        };
        trace!(
            "worker {id} claimed rows {}..{}",
            chunk.row_start,
            chunk.row_end
        );

        let alive = process_chunk(grid, chunk, &mut above, &mut row, &mut below, &mut out);

        let mut state = relock(pool.state.lock());
        // a straggler from a timed-out dispatch finishes its chunk but
        // must not touch a later dispatch's accounting
        if state.epoch == epoch {
            state.active -= 1;
            state.population += alive;
            if state.cursor >= state.chunks.len() && state.active == 0 {
                pool.all_done.notify_one();
            }
        }
    }
}

fn process_chunk(
    grid: &Grid,
    chunk: Chunk,
    above: &mut [u8],
    row: &mut [u8],
    below: &mut [u8],
    out: &mut [u8],
) -> u64 {
    let height = grid.height();
    let mut alive = 0;
    for y in chunk.row_start..chunk.row_end {
        grid.load_row(y, row);
        let above = if y > 0 {
            grid.load_row(y - 1, above);
            Some(&*above)
        } else {
            None
        };
        let below = if y + 1 < height {
            grid.load_row(y + 1, below);
            Some(&*below)
        } else {
            None
        };
        alive += step_row(above, row, below, out);
        grid.store_next_row(y, out);
    }
    alive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule;

    fn pool_config(workers: usize, max_iterations: u32, base_chunk: usize) -> EngineConfig {
        EngineConfig {
            workers,
            max_iterations,
            base_chunk,
            ..EngineConfig::default()
        }
    }

    fn serial_step(width: usize, rows: &[Vec<u8>]) -> (Vec<Vec<u8>>, u64) {
        let mut next = vec![vec![0u8; width]; rows.len()];
        let mut alive = 0;
        for y in 0..rows.len() {
            let above = y.checked_sub(1).map(|a| rows[a].as_slice());
            let below = rows.get(y + 1).map(|b| b.as_slice());
            alive += rule::step_row(above, &rows[y], below, &mut next[y]);
        }
        (next, alive)
    }

    fn grid_rows(grid: &Grid) -> Vec<Vec<u8>> {
        (0..grid.height())
            .map(|y| {
                let mut row = vec![0u8; grid.width()];
                grid.load_row(y, &mut row);
                row
            })
            .collect()
    }

    #[test]
    fn reference_trace_of_the_verification_world() {
        let grid = Grid::test_pattern();
        let outcome = run(&grid, &pool_config(2, 200, 64));
        assert_eq!(outcome.populations, vec![5, 4, 3, 2, 0]);
        assert_eq!(outcome.iterations, 5);
        assert!(!outcome.timed_out);
        assert!(grid.snapshot().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn matches_a_serial_run_with_many_small_chunks() {
        let (width, height) = (48, 37);
        let cells: Vec<u8> = (0..width * height)
            .map(|i| u8::from((i * 7 + 3) % 11 == 0))
            .collect();
        let grid = Grid::from_cells(width, height, &cells).unwrap();
        let outcome = run(&grid, &pool_config(4, 5, 1));

        // drive the serial reference with the same stopping predicate
        let initial: u64 = cells.iter().map(|&c| u64::from(c)).sum();
        let mut rows: Vec<Vec<u8>> = cells.chunks(width).map(<[u8]>::to_vec).collect();
        let mut expected = Vec::new();
        let mut count = initial;
        let mut iteration = 0;
        while keep_running(iteration, count, initial, 5) {
            let (next, alive) = serial_step(width, &rows);
            rows = next;
            count = alive;
            expected.push(alive);
            iteration += 1;
        }
        assert_eq!(outcome.populations, expected);
        assert_eq!(grid_rows(&grid), rows);
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let (width, height) = (30, 25);
        let cells: Vec<u8> = (0..width * height)
            .map(|i| u8::from((i * 13 + 5) % 7 == 0))
            .collect();
        let one = Grid::from_cells(width, height, &cells).unwrap();
        let eight = Grid::from_cells(width, height, &cells).unwrap();
        let a = run(&one, &pool_config(1, 10, 3));
        let b = run(&eight, &pool_config(8, 10, 3));
        assert_eq!(a.populations, b.populations);
        assert_eq!(one.snapshot(), eight.snapshot());
    }

    #[test]
    fn empty_world_stops_before_the_first_iteration() {
        let grid = Grid::new(10, 10).unwrap();
        let outcome = run(&grid, &pool_config(3, 200, 64));
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.populations.is_empty());
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn stalled_iteration_times_out_and_continues() {
        // no workers ever claim a chunk, so the bounded wait must expire
        let grid = Grid::test_pattern();
        let config = EngineConfig {
            workers: 0,
            max_iterations: 3,
            sync_timeout: Duration::from_millis(50),
            ..EngineConfig::default()
        };
        let outcome = run(&grid, &config);
        assert!(outcome.timed_out);
        // nothing wrote the next buffer; the recount sees the swapped
        // all-dead world and the run stops there
        assert_eq!(outcome.populations, vec![0]);
        assert_eq!(outcome.iterations, 1);
        assert!(grid.snapshot().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn iteration_cap_is_exact() {
        // a 2x2 block is a still life; only the cap can stop it
        let mut cells = vec![0u8; 8 * 8];
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            cells[y * 8 + x] = 1;
        }
        let grid = Grid::from_cells(8, 8, &cells).unwrap();
        let outcome = run(&grid, &pool_config(2, 7, 2));
        assert_eq!(outcome.iterations, 7);
        assert_eq!(outcome.populations, vec![4; 7]);
        assert_eq!(grid.snapshot(), cells);
    }
}
