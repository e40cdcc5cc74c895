//! The birth/death rule and its neighborhood kernels.

use crate::error::EngineError;
use crate::grid::Grid;

/// Next state for a cell with `count` live neighbors.
///
/// One or fewer neighbors dies of isolation, four or more dies of
/// overcrowding, exactly three births a cell, exactly two keeps the
/// current state. Total and pure.
#[inline]
pub fn next_state(count: u32, current: u8) -> u8 {
    if count <= 1 {
        0
    } else if count >= 4 {
        0
    } else if count == 3 {
        1
    } else {
        current // count == 2, no change
    }
}

/// Live neighbors of `(x, y)` in the current buffer.
///
/// Corner and edge cells see only the 3- or 5-cell subsets that exist;
/// there is no wraparound.
#[allow(dead_code)] // cell-level reference for the row kernel
pub fn neighbor_count(grid: &Grid, x: usize, y: usize) -> Result<u32, EngineError> {
    let (width, height) = (grid.width(), grid.height());
    if x >= width || y >= height {
        return Err(EngineError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }
    let x_hi = (x + 1).min(width - 1);
    let y_hi = (y + 1).min(height - 1);
    let mut count = 0;
    for ny in y.saturating_sub(1)..=y_hi {
        for nx in x.saturating_sub(1)..=x_hi {
            if (nx, ny) != (x, y) {
                count += grid.cell(nx, ny) as u32;
            }
        }
    }
    Ok(count)
}

/// Applies the rule to one row given its vertical neighborhood.
///
/// `above` and `below` are `None` at the global edges. The row's next
/// state lands in `out`; the return value is how many of those cells are
/// alive.
pub fn step_row(above: Option<&[u8]>, row: &[u8], below: Option<&[u8]>, out: &mut [u8]) -> u64 {
    debug_assert_eq!(row.len(), out.len());
    let width = row.len();
    let mut alive = 0u64;
    for x in 0..width {
        let hi = (x + 1).min(width - 1);
        let mut count = 0u32;
        for nx in x.saturating_sub(1)..=hi {
            if let Some(above) = above {
                count += above[nx] as u32;
            }
            if let Some(below) = below {
                count += below[nx] as u32;
            }
            if nx != x {
                count += row[nx] as u32;
            }
        }
        let state = next_state(count, row[x]);
        out[x] = state;
        alive += state as u64;
    }
    alive
}
