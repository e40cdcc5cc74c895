//! Independent units with explicit halo exchange.
//!
//! Each partition runs on its own thread with a private copy of its rows,
//! one halo row above and one below. Before every update the units trade
//! boundary rows over channels, issuing both sends before waiting on
//! either receive. The controller broadcasts the continue/stop verdict,
//! sums the per-unit population reports, and gathers the final rows back
//! into the grid when the run ends. No unit ever touches another unit's
//! memory.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::debug;

use crate::config::EngineConfig;
use crate::engine::{keep_running, RunOutcome};
use crate::error::EngineError;
use crate::grid::Grid;
use crate::partition::{partition_rows, Partition};
use crate::rule::step_row;

/// Channel ends a unit shares with its vertical neighbors. `None` at the
/// global top and bottom edges.
#[derive(Default)]
struct HaloLinks {
    up_tx: Option<Sender<Vec<u8>>>,
    up_rx: Option<Receiver<Vec<u8>>>,
    down_tx: Option<Sender<Vec<u8>>>,
    down_rx: Option<Receiver<Vec<u8>>>,
}

/// A unit's private rows. Local row `0` and `rows + 1` are halos; the
/// interior lives at `1..=rows`. Halo rows at the global edges stay zero
/// for the whole run, which makes the full-window kernel equal to the
/// edge-subset rule.
struct LocalBlock {
    start_row: usize,
    rows: usize,
    cur: Vec<Vec<u8>>,
    nxt: Vec<Vec<u8>>,
}

impl LocalBlock {
    fn from_grid(grid: &Grid, part: &Partition) -> Self {
        let width = grid.width();
        let rows = part.rows();
        let mut cur = vec![vec![0u8; width]; rows + 2];
        for r in 0..rows {
            grid.load_row(part.row_start + r, &mut cur[r + 1]);
        }
        Self {
            start_row: part.row_start,
            rows,
            cur,
            nxt: vec![vec![0u8; width]; rows + 2],
        }
    }

    fn send_boundaries(&self, links: &HaloLinks, unit: usize) -> Result<(), EngineError> {
        if let Some(tx) = &links.up_tx {
            tx.send(self.cur[1].clone())
                .map_err(|_| EngineError::CommunicationFailure { unit })?;
        }
        if let Some(tx) = &links.down_tx {
            tx.send(self.cur[self.rows].clone())
                .map_err(|_| EngineError::CommunicationFailure { unit })?;
        }
        Ok(())
    }

    fn recv_halos(&mut self, links: &HaloLinks, unit: usize) -> Result<(), EngineError> {
        if let Some(rx) = &links.up_rx {
            self.cur[0] = rx
                .recv()
                .map_err(|_| EngineError::CommunicationFailure { unit })?;
        }
        if let Some(rx) = &links.down_rx {
            self.cur[self.rows + 1] = rx
                .recv()
                .map_err(|_| EngineError::CommunicationFailure { unit })?;
        }
        Ok(())
    }

    /// Steps the interior rows, returns how many cells are now alive.
    fn update(&mut self) -> u64 {
        let mut alive = 0;
        for y in 1..=self.rows {
            alive += step_row(
                Some(&self.cur[y - 1]),
                &self.cur[y],
                Some(&self.cur[y + 1]),
                &mut self.nxt[y],
            );
        }
        alive
    }

    fn swap(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.nxt);
    }

    /// Interior rows, flattened row-major for the final gather.
    fn interior(&self) -> Vec<u8> {
        self.cur[1..=self.rows].concat()
    }
}

/// One execution unit: a block, its neighbor links, and its three
/// controller channels.
struct Unit {
    index: usize,
    block: LocalBlock,
    links: HaloLinks,
    ctrl: Receiver<bool>,
    report: Sender<u64>,
    gather: Sender<Vec<u8>>,
}

impl Unit {
    fn run(mut self) -> Result<(), EngineError> {
        debug!(
            "unit {} owns rows {}..{}",
            self.index,
            self.block.start_row,
            self.block.start_row + self.block.rows
        );
        loop {
            let go = self
                .ctrl
                .recv()
                .map_err(|_| EngineError::CommunicationFailure { unit: self.index })?;
            if !go {
                break;
            }
            self.block.send_boundaries(&self.links, self.index)?;
            self.block.recv_halos(&self.links, self.index)?;
            let alive = self.block.update();
            self.block.swap();
            self.report
                .send(alive)
                .map_err(|_| EngineError::CommunicationFailure { unit: self.index })?;
        }
        self.gather
            .send(self.block.interior())
            .map_err(|_| EngineError::CommunicationFailure { unit: self.index })?;
        Ok(())
    }
}

/// Wires the boundary channels between vertically adjacent units.
fn link_units(parts: &[Partition]) -> Vec<HaloLinks> {
    let mut links: Vec<HaloLinks> = (0..parts.len()).map(|_| HaloLinks::default()).collect();
    for part in parts {
        if part.has_lower_neighbor() {
            let (down_tx, up_rx) = mpsc::channel();
            let (up_tx, down_rx) = mpsc::channel();
            links[part.index].down_tx = Some(down_tx);
            links[part.index].down_rx = Some(down_rx);
            links[part.index + 1].up_rx = Some(up_rx);
            links[part.index + 1].up_tx = Some(up_tx);
        }
    }
    links
}

/// Runs the simulation with one private-memory unit per partition.
///
/// The final state is gathered back into the grid's current buffer. Any
/// failed channel operation aborts the run; there is no partial-grid
/// recovery for a lost unit.
pub fn run(grid: &Grid, config: &EngineConfig) -> Result<RunOutcome, EngineError> {
    let parts = partition_rows(grid.height(), config.workers)?;
    let units = parts.len();
    let initial = grid.population();

    thread::scope(|scope| -> Result<RunOutcome, EngineError> {
        // every controller-side endpoint lives inside this scope, so an
        // early error drops them and the units fail fast instead of
        // blocking the join
        let mut ctrl_txs = Vec::with_capacity(units);
        let mut report_rxs = Vec::with_capacity(units);
        let mut gather_rxs = Vec::with_capacity(units);
        let mut handles = Vec::with_capacity(units);

        for (index, (part, links)) in parts.iter().zip(link_units(&parts)).enumerate() {
            debug_assert_eq!(links.up_rx.is_some(), part.has_upper_neighbor());
            debug_assert_eq!(links.down_rx.is_some(), part.has_lower_neighbor());
            let (ctrl_tx, ctrl_rx) = mpsc::channel();
            let (report_tx, report_rx) = mpsc::channel();
            let (gather_tx, gather_rx) = mpsc::channel();
            ctrl_txs.push(ctrl_tx);
            report_rxs.push(report_rx);
            gather_rxs.push(gather_rx);

            let unit = Unit {
                index,
                block: LocalBlock::from_grid(grid, part),
                links,
                ctrl: ctrl_rx,
                report: report_tx,
                gather: gather_tx,
            };
            handles.push((index, scope.spawn(move || unit.run())));
        }

        let mut iteration = 0u32;
        let mut count = initial;
        let mut populations = Vec::new();

        loop {
            let go = keep_running(iteration, count, initial, config.max_iterations);
            for (unit, tx) in ctrl_txs.iter().enumerate() {
                tx.send(go)
                    .map_err(|_| EngineError::CommunicationFailure { unit })?;
            }
            if !go {
                break;
            }
            let mut total = 0;
            for (unit, rx) in report_rxs.iter().enumerate() {
                total += rx
                    .recv()
                    .map_err(|_| EngineError::CommunicationFailure { unit })?;
            }
            count = total;
            println!("iter = {iteration}, population count = {count}");
            populations.push(count);
            iteration += 1;
        }

        for (unit, (part, rx)) in parts.iter().zip(&gather_rxs).enumerate() {
            let flat = rx
                .recv()
                .map_err(|_| EngineError::CommunicationFailure { unit })?;
            for (r, row) in flat.chunks(grid.width()).enumerate() {
                grid.store_next_row(part.row_start + r, row);
            }
        }
        grid.swap_buffers();

        for (unit, handle) in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => return Err(EngineError::CommunicationFailure { unit }),
            }
        }

        Ok(RunOutcome {
            iterations: iteration,
            populations,
            timed_out: false,
        })
    })
}
