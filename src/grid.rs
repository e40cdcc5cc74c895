//! Double-buffered world storage.
//!
//! The grid owns two same-shape byte buffers. During an update pass the
//! current buffer is read-only and the next buffer is write-only; the
//! controller swaps their roles in O(1) between iterations.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::EngineError;

/// Width of the built-in verification world
pub const TEST_WIDTH: usize = 4;
/// Height of the built-in verification world
pub const TEST_HEIGHT: usize = 6;

/// Double-buffered cell store, `0` dead and `1` alive.
///
/// All atomic accesses are Relaxed: cross-thread visibility is ordered by
/// the scheduler's queue lock or the exchange channels, never by these
/// atomics themselves.
pub struct Grid {
    width: usize,
    height: usize,
    buffers: [Box<[AtomicU8]>; 2],
    front: AtomicUsize,
}

impl Grid {
    fn alloc(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            buffers: [Self::buffer(cells), Self::buffer(cells)],
            front: AtomicUsize::new(0),
        }
    }

    fn buffer(cells: usize) -> Box<[AtomicU8]> {
        (0..cells).map(|_| AtomicU8::new(0)).collect()
    }

    /// Creates an all-dead grid sized exactly to the request.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        Ok(Self::alloc(width, height))
    }

    /// Builds a grid from row-major cell bytes.
    #[allow(dead_code)]
    pub fn from_cells(width: usize, height: usize, cells: &[u8]) -> Result<Self, EngineError> {
        let grid = Self::new(width, height)?;
        assert_eq!(cells.len(), width * height);
        for (slot, &cell) in grid.current().iter().zip(cells) {
            slot.store(cell, Ordering::Relaxed);
        }
        Ok(grid)
    }

    /// The fixed 4x6 world used for correctness verification.
    pub fn test_pattern() -> Self {
        let grid = Self::alloc(TEST_WIDTH, TEST_HEIGHT);
        let alive = [
            (3, 0),
            (3, 1),
            (1, 2),
            (0, 3),
            (1, 3),
            (2, 3),
            (1, 4),
            (1, 5),
        ];
        for (x, y) in alive {
            grid.put(x, y, 1);
        }
        grid
    }

    /// Deterministic seed for sized grids: both diagonals alive.
    pub fn diagonal_cross(width: usize, height: usize) -> Result<Self, EngineError> {
        let grid = Self::new(width, height)?;
        for i in 0..width.min(height) {
            grid.put(i, i, 1);
            grid.put(i, height - 1 - i, 1);
        }
        Ok(grid)
    }

    /// Fills a sized grid with each cell alive at probability `density`.
    pub fn random(
        width: usize,
        height: usize,
        density: f64,
        rng: &mut StdRng,
    ) -> Result<Self, EngineError> {
        let grid = Self::new(width, height)?;
        let density = density.clamp(0.0, 1.0);
        for slot in grid.current() {
            if rng.gen_bool(density) {
                slot.store(1, Ordering::Relaxed);
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn current(&self) -> &[AtomicU8] {
        &self.buffers[self.front.load(Ordering::Relaxed)]
    }

    fn next(&self) -> &[AtomicU8] {
        &self.buffers[self.front.load(Ordering::Relaxed) ^ 1]
    }

    fn put(&self, x: usize, y: usize, state: u8) {
        self.current()[y * self.width + x].store(state, Ordering::Relaxed);
    }

    fn check(&self, x: usize, y: usize) -> Result<usize, EngineError> {
        if x >= self.width || y >= self.height {
            return Err(EngineError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    /// Reads a cell from the current buffer.
    #[allow(dead_code)]
    pub fn get(&self, x: usize, y: usize) -> Result<u8, EngineError> {
        let idx = self.check(x, y)?;
        Ok(self.current()[idx].load(Ordering::Relaxed))
    }

    /// Writes a cell into the next buffer.
    #[allow(dead_code)]
    pub fn set_next(&self, x: usize, y: usize, state: u8) -> Result<(), EngineError> {
        let idx = self.check(x, y)?;
        self.next()[idx].store(state, Ordering::Relaxed);
        Ok(())
    }

    /// Current-buffer read for callers that already validated the
    /// coordinates.
    pub(crate) fn cell(&self, x: usize, y: usize) -> u8 {
        self.current()[y * self.width + x].load(Ordering::Relaxed)
    }

    /// Exchanges the roles of the current and next buffers in O(1).
    pub fn swap_buffers(&self) {
        self.front.fetch_xor(1, Ordering::Relaxed);
    }

    /// Copies row `y` of the current buffer into `out`.
    pub fn load_row(&self, y: usize, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.width);
        let row = &self.current()[y * self.width..(y + 1) * self.width];
        for (dst, src) in out.iter_mut().zip(row) {
            *dst = src.load(Ordering::Relaxed);
        }
    }

    /// Stores `row` into row `y` of the next buffer.
    pub fn store_next_row(&self, y: usize, row: &[u8]) {
        debug_assert_eq!(row.len(), self.width);
        let dst = &self.next()[y * self.width..(y + 1) * self.width];
        for (slot, &src) in dst.iter().zip(row) {
            slot.store(src, Ordering::Relaxed);
        }
    }

    /// Counts live cells in the current buffer.
    pub fn population(&self) -> u64 {
        self.current()
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed) as u64)
            .sum()
    }

    /// Row-major copy of the current buffer.
    pub fn snapshot(&self) -> Vec<u8> {
        self.current()
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }
}
