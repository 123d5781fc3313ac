//! Work decomposition: partitioning `[0, N)` into one interval per block.
//!
//! Intervals are contiguous, non-overlapping, in block order, and their sizes
//! differ by at most one element. The larger intervals come first, so if any
//! interval is shorter it sits at the tail. Empty intervals never occur.

use std::ops::Range;

use crate::config::LaunchConfig;

/// A half-open `[begin, end)` range of indices processed by one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub begin: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

impl From<IndexRange> for Range<usize> {
    fn from(range: IndexRange) -> Self {
        range.begin..range.end
    }
}

/// An even split of `[0, total)` into `len()` intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDecomposition {
    total: usize,
    intervals: usize,
    /// Size of the short intervals; the first `threshold` intervals hold one more.
    small_interval: usize,
    threshold: usize,
}

impl UniformDecomposition {
    /// Splits `[0, total)` into `min(num_intervals, total)` intervals.
    ///
    /// `total == 0` (or `num_intervals == 0`) yields an empty decomposition.
    pub fn new(total: usize, num_intervals: usize) -> Self {
        let intervals = num_intervals.min(total);
        if intervals == 0 {
            return Self {
                total,
                intervals: 0,
                small_interval: 0,
                threshold: 0,
            };
        }
        Self {
            total,
            intervals,
            small_interval: total / intervals,
            threshold: total % intervals,
        }
    }

    /// Number of intervals, which is also the number of blocks to launch.
    pub fn len(&self) -> usize {
        self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals == 0
    }

    /// Size of the index domain being decomposed.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The interval assigned to block `index`.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    pub fn interval(&self, index: usize) -> IndexRange {
        assert!(
            index < self.intervals,
            "interval {} out of range for a decomposition of {} intervals",
            index,
            self.intervals
        );
        let large_interval = self.small_interval + 1;
        if index < self.threshold {
            let begin = large_interval * index;
            IndexRange {
                begin,
                end: begin + large_interval,
            }
        } else {
            let begin = large_interval * self.threshold + self.small_interval * (index - self.threshold);
            IndexRange {
                begin,
                end: begin + self.small_interval,
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = IndexRange> + '_ {
        (0..self.intervals).map(move |i| self.interval(i))
    }
}

/// The decomposition used by the library's algorithms for `n` elements.
///
/// One block per `threads_per_block` elements, capped at `config.max_blocks()`.
pub fn default_decomposition(n: usize, config: &LaunchConfig) -> UniformDecomposition {
    let threads = config.threads_per_block.max(1);
    let wanted = n.div_ceil(threads);
    UniformDecomposition::new(n, wanted.min(config.max_blocks()))
}
