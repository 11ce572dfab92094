//! # Chunk partitioning
//!
//! A [`Chunk`] is a half-open range `[start, end)` of population indices that
//! is handed to one worker as a single unit of work. Chunks of one phase are
//! contiguous and never overlap, which is what lets workers own their slice of
//! the population without any locking. They are only ever produced by
//! [`partition`].
//!
//! ## Example
//!
//! ```rust
//! use knapsack_ga::chunk::partition;
//!
//! let chunks = partition(23, 0, 5).unwrap();
//! let ranges: Vec<_> = chunks.iter().map(|chunk| chunk.range()).collect();
//!
//! assert_eq!(ranges, vec![0..5, 5..10, 10..15, 15..20, 20..23]);
//! ```

use std::fmt;
use std::ops::Range;

use crate::error::{GeneticError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    start: usize,
    end: usize,
}

impl Chunk {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Splits `[start_offset, total)` into contiguous chunks of `chunk_size`
/// indices. The last chunk is clipped to `total`.
///
/// An offset at or past `total` yields no chunks.
///
/// # Errors
///
/// Returns a `Configuration` error if `chunk_size` is zero.
pub fn partition(total: usize, start_offset: usize, chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(GeneticError::Configuration(
            "Chunk size must be positive".to_string(),
        ));
    }

    let chunks = (start_offset..total)
        .step_by(chunk_size)
        .map(|start| Chunk {
            start,
            end: start.saturating_add(chunk_size).min(total),
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_clips_last_chunk() {
        let chunks = partition(23, 0, 5).unwrap();
        let bounds: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start(), c.end())).collect();

        assert_eq!(bounds, vec![(0, 5), (5, 10), (10, 15), (15, 20), (20, 23)]);
    }

    #[test]
    fn test_partition_with_offset() {
        let chunks = partition(10, 1, 4).unwrap();
        let ranges: Vec<Range<usize>> = chunks.iter().map(Chunk::range).collect();

        assert_eq!(ranges, vec![1..5, 5..9, 9..10]);
    }

    #[test]
    fn test_partition_covers_range_without_overlap() {
        for (total, offset, size) in [(100, 0, 7), (100, 1, 7), (1, 0, 500), (500, 1, 500)] {
            let chunks = partition(total, offset, size).unwrap();

            let mut expected = offset;
            for chunk in &chunks {
                assert_eq!(chunk.start(), expected);
                assert!(!chunk.is_empty());
                assert!(chunk.len() <= size);
                expected = chunk.end();
            }
            assert_eq!(expected, total.max(offset));
        }
    }

    #[test]
    fn test_partition_is_pure() {
        assert_eq!(partition(57, 3, 8).unwrap(), partition(57, 3, 8).unwrap());
    }

    #[test]
    fn test_partition_empty_range() {
        assert!(partition(5, 5, 2).unwrap().is_empty());
        assert!(partition(5, 9, 2).unwrap().is_empty());
        assert!(partition(0, 0, 2).unwrap().is_empty());
    }

    #[test]
    fn test_partition_rejects_zero_chunk_size() {
        assert!(matches!(
            partition(10, 0, 0),
            Err(GeneticError::Configuration(_))
        ));
    }

    #[test]
    fn test_chunk_display() {
        let chunk = partition(10, 2, 3).unwrap()[0];
        assert_eq!(chunk.to_string(), "[2, 5)");
        assert!(chunk.contains(4));
        assert!(!chunk.contains(5));
    }
}
