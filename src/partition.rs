//! Row-range decomposition of the grid across execution units.

use crate::error::EngineError;

/// A contiguous row range owned by one execution unit.
///
/// Ranges use global row coordinates, `row_end` exclusive. Partitions for
/// one grid are disjoint and tile `[0, height)` exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub units: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl Partition {
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    /// A neighbor exists above unless this is the topmost partition.
    pub fn has_upper_neighbor(&self) -> bool {
        self.index > 0
    }

    /// A neighbor exists below unless this is the bottom partition.
    pub fn has_lower_neighbor(&self) -> bool {
        self.index + 1 < self.units
    }
}

/// Splits `height` rows across `units` partitions.
///
/// The first `height % units` partitions take one extra row, so any two
/// partitions differ by at most one row. A unit count of zero, or more
/// units than rows, cannot be tiled and is an error.
pub fn partition_rows(height: usize, units: usize) -> Result<Vec<Partition>, EngineError> {
    if units == 0 || units > height {
        return Err(EngineError::ResourceExhausted {
            rows: height,
            units,
        });
    }
    let base = height / units;
    let remainder = height % units;
    let mut parts = Vec::with_capacity(units);
    let mut start = 0;
    for index in 0..units {
        let rows = base + usize::from(index < remainder);
        parts.push(Partition {
            index,
            units,
            row_start: start,
            row_end: start + rows,
        });
        start += rows;
    }
    // tiling invariant: the ranges must cover every row exactly once
    assert_eq!(start, height);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(height: usize, units: usize) {
        let parts = partition_rows(height, units).unwrap();
        assert_eq!(parts.len(), units);
        let mut next = 0;
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.index, i);
            assert_eq!(part.row_start, next, "gap or overlap before unit {i}");
            assert!(part.rows() > 0);
            next = part.row_end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn tiles_without_gaps_or_overlaps() {
        for (height, units) in [(10, 3), (6, 3), (7, 7), (100, 7), (5, 4), (1, 1), (64, 4)] {
            assert_tiles(height, units);
        }
    }

    #[test]
    fn row_counts_differ_by_at_most_one() {
        for (height, units) in [(10, 3), (100, 7), (23, 5)] {
            let parts = partition_rows(height, units).unwrap();
            let min = parts.iter().map(Partition::rows).min().unwrap();
            let max = parts.iter().map(Partition::rows).max().unwrap();
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn remainder_goes_to_the_first_partitions() {
        let parts = partition_rows(10, 3).unwrap();
        assert_eq!(
            parts.iter().map(Partition::rows).collect::<Vec<_>>(),
            vec![4, 3, 3]
        );
        let parts = partition_rows(23, 5).unwrap();
        assert_eq!(
            parts.iter().map(Partition::rows).collect::<Vec<_>>(),
            vec![5, 5, 5, 4, 4]
        );
    }

    #[test]
    fn neighbor_flags_follow_position() {
        let parts = partition_rows(9, 3).unwrap();
        assert!(!parts[0].has_upper_neighbor());
        assert!(parts[0].has_lower_neighbor());
        assert!(parts[1].has_upper_neighbor());
        assert!(parts[1].has_lower_neighbor());
        assert!(parts[2].has_upper_neighbor());
        assert!(!parts[2].has_lower_neighbor());
    }

    #[test]
    fn impossible_splits_are_rejected() {
        assert!(matches!(
            partition_rows(6, 0),
            Err(EngineError::ResourceExhausted { rows: 6, units: 0 })
        ));
        assert!(matches!(
            partition_rows(3, 4),
            Err(EngineError::ResourceExhausted { rows: 3, units: 4 })
        ));
    }

    #[test]
    fn one_row_per_unit_at_the_limit() {
        let parts = partition_rows(5, 5).unwrap();
        assert!(parts.iter().all(|p| p.rows() == 1));
    }
}
