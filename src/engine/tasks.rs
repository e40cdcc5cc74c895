//! Adaptive chunk planning for one iteration of the worker pool.
//!
//! Chunks are produced fresh every iteration and consumed front to back.
//! Early iterations get large leading chunks to keep scheduling overhead
//! low; as the run ages the leading tier shrinks so stragglers hurt less.

use log::warn;

/// Ceiling on chunks planned for a single iteration. Hitting it coarsens
/// the chunk size rather than dropping work.
pub const MAX_CHUNKS: usize = 10_000;

/// One unit of update work: rows `[row_start, row_end)`, written to the
/// next buffer. Never crosses a partition boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub row_start: usize,
    pub row_end: usize,
}

impl Chunk {
    #[allow(dead_code)]
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }
}

/// Plans the chunk queue for one iteration over `rows` rows.
///
/// Three size tiers, front to back: the first third of the chunk count at
/// five times the base size, the middle third at the mean of the large and
/// base sizes, the rest at the base size. `iteration` counts from zero;
/// once the 1-based number passes 10 the large tier shrinks hyperbolically
/// toward a floor of twice the base size. Chunk sizes never increase from
/// one position to the next within an iteration.
pub fn plan_chunks(rows: usize, iteration: u32, base: usize) -> Vec<Chunk> {
    let mut base = base.max(1);
    let mut num_chunks = rows.div_ceil(base).max(2);
    let mut first = base.saturating_mul(5);
    let mut last = base;

    let rank = iteration as usize + 1;
    if rank > 10 {
        first = (first.saturating_mul(10) / (rank / 2 + 10)).max(base.saturating_mul(2));
    }

    if num_chunks > MAX_CHUNKS {
        warn!("increasing chunk size to stay under the {MAX_CHUNKS} task limit");
        base = rows / MAX_CHUNKS + 1;
        num_chunks = rows.div_ceil(base);
        first = base * 5;
        last = base;
    }

    let third = (num_chunks / 3).max(1);
    let mut chunks = Vec::with_capacity(num_chunks);
    let mut row = 0;

    for _ in 0..third {
        if row >= rows {
            break;
        }
        let end = row.saturating_add(first).min(rows);
        chunks.push(Chunk {
            row_start: row,
            row_end: end,
        });
        row = end;
    }

    let medium = first.saturating_add(last) / 2;
    for _ in 0..third {
        if row >= rows {
            break;
        }
        let end = row.saturating_add(medium).min(rows);
        chunks.push(Chunk {
            row_start: row,
            row_end: end,
        });
        row = end;
    }

    while row < rows {
        let end = row.saturating_add(last).min(rows);
        chunks.push(Chunk {
            row_start: row,
            row_end: end,
        });
        row = end;
    }

    chunks
}
