// In: src/kernels/reduce_intervals.rs

//! Interval reduction: one reduced value per interval of a decomposition.
//!
//! Block `b` reduces interval `b` and writes the result to `output[b]`. The
//! interval is consumed in chunks of one value per lane; each chunk is scanned
//! in block-local memory and lane 0 folds the chunk total into a running carry.
//! Values are combined strictly left to right, so `op` only has to be
//! associative, and no identity element is needed.

use crate::config::LaunchConfig;
use crate::context::{launch_closure, BlockKernel, ExecutionContext};
use crate::decomposition::UniformDecomposition;
use crate::error::{Result, WarpackError};
use crate::kernels::block_scan::inplace_inclusive_scan_n;
use crate::memory::{SharedArray, UnsafeSlice};
use crate::view::IndexedSource;

/// Writes the `op`-reduction of each interval of `decomposition` over `values`
/// to the matching slot of `output`.
pub fn reduce_intervals<V, T, F>(
    config: &LaunchConfig,
    values: &V,
    output: &mut [T],
    op: F,
    decomposition: &UniformDecomposition,
) -> Result<()>
where
    V: IndexedSource<Item = T>,
    T: Copy + Default + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    debug_assert_eq!(values.len(), decomposition.total());
    if output.len() < decomposition.len() {
        return Err(WarpackError::OutputTooSmall {
            required: decomposition.len(),
            available: output.len(),
        });
    }
    if decomposition.is_empty() {
        return Ok(());
    }

    log::debug!(
        "reduce_intervals: {} values over {} intervals",
        decomposition.total(),
        decomposition.len()
    );

    let kernel = ReduceIntervals {
        values,
        output: UnsafeSlice::from(output),
        op,
        decomposition,
    };
    launch_closure(config, &kernel, decomposition.len(), config.threads_per_block)
}

struct ReduceIntervals<'a, V, T, F> {
    values: &'a V,
    output: UnsafeSlice<'a, T>,
    op: F,
    decomposition: &'a UniformDecomposition,
}

impl<V, T, F> BlockKernel for ReduceIntervals<'_, V, T, F>
where
    V: IndexedSource<Item = T>,
    T: Copy + Default + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    type Shared = SharedArray<T>;

    fn shared(&self, block_dimension: usize) -> SharedArray<T> {
        SharedArray::new(block_dimension)
    }

    fn run<C: ExecutionContext>(&self, ctx: &C, sdata: &SharedArray<T>) {
        let lane = ctx.thread_index();
        let block = ctx.block_index();
        let interval = self.decomposition.interval(block);

        // Only lane 0's carry is meaningful.
        let mut carry: Option<T> = None;
        let mut chunk_begin = interval.begin;
        while chunk_begin < interval.end {
            let n = ctx.block_dimension().min(interval.end - chunk_begin);

            unsafe {
                if lane < n {
                    sdata.store(lane, self.values.at(chunk_begin + lane));
                }
                ctx.barrier();

                inplace_inclusive_scan_n(ctx, sdata, n, &self.op);

                if lane == 0 {
                    let total = sdata.load(n - 1);
                    carry = Some(match carry {
                        Some(acc) => (self.op)(acc, total),
                        None => total,
                    });
                }
            }
            ctx.barrier();

            chunk_begin += n;
        }

        if lane == 0 {
            if let Some(total) = carry {
                // SAFETY: slot `block` is written by this lane of this block only.
                unsafe { self.output.write(block, total) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockScheduling;
    use crate::view::PredicateToIntegral;

    fn config(threads: usize) -> LaunchConfig {
        LaunchConfig::default().with_threads_per_block(threads)
    }

    #[test]
    fn test_sum_per_interval() {
        let values: Vec<u64> = (1..=10).collect();
        let decomposition = UniformDecomposition::new(values.len(), 3);
        let mut output = vec![0u64; 3];
        let source = values.as_slice().map(|x: &u64| *x);
        reduce_intervals(&config(2), &source, &mut output, |a, b| a + b, &decomposition).unwrap();
        // Intervals [0,4), [4,7), [7,10).
        assert_eq!(output, vec![1 + 2 + 3 + 4, 5 + 6 + 7, 8 + 9 + 10]);
    }

    #[test]
    fn test_interval_shorter_than_block() {
        let values = [3u32, 4, 5];
        let decomposition = UniformDecomposition::new(3, 2);
        let mut output = vec![0u32; 2];
        let source = values.as_slice().map(|x: &u32| *x);
        reduce_intervals(&config(16), &source, &mut output, |a, b| a + b, &decomposition).unwrap();
        assert_eq!(output, vec![7, 5]);
    }

    #[test]
    fn test_non_commutative_reduction_keeps_order() {
        // Affine composition: associative, not commutative.
        let compose = |l: (i64, i64), r: (i64, i64)| (l.0 * r.0, l.1 * r.0 + r.1);
        let values: Vec<(i64, i64)> = (0..23).map(|i| (1 + i % 3, i - 7)).collect();
        let decomposition = UniformDecomposition::new(values.len(), 2);
        let mut output = vec![(0, 0); 2];
        let source = values.as_slice().map(|x: &(i64, i64)| *x);
        reduce_intervals(&config(4), &source, &mut output, compose, &decomposition).unwrap();

        for (slot, interval) in decomposition.iter().enumerate() {
            let expected = values[interval.begin + 1..interval.end]
                .iter()
                .fold(values[interval.begin], |acc, &v| compose(acc, v));
            assert_eq!(output[slot], expected);
        }
    }

    #[test]
    fn test_counts_predicate_hits_under_every_schedule() {
        let stencil: Vec<i32> = (0..101).collect();
        let bits: PredicateToIntegral<_, _, usize> =
            PredicateToIntegral::new(stencil.as_slice(), |x: &i32| x % 3 == 0);
        let decomposition = UniformDecomposition::new(stencil.len(), 5);

        for scheduling in [
            BlockScheduling::Parallel,
            BlockScheduling::Sequential,
            BlockScheduling::Reversed,
        ] {
            let mut counts = vec![0usize; 5];
            let launch = config(8).with_scheduling(scheduling);
            reduce_intervals(&launch, &bits, &mut counts, |a, b| a + b, &decomposition).unwrap();
            assert_eq!(counts.iter().sum::<usize>(), 34);
            for (slot, interval) in decomposition.iter().enumerate() {
                let expected = (interval.begin..interval.end).filter(|i| i % 3 == 0).count();
                assert_eq!(counts[slot], expected);
            }
        }
    }

    #[test]
    fn test_short_output_is_rejected() {
        let values = [1u8, 2, 3, 4];
        let decomposition = UniformDecomposition::new(4, 4);
        let mut output = vec![0u8; 3];
        let source = values.as_slice().map(|x: &u8| *x);
        let result = reduce_intervals(&config(2), &source, &mut output, |a, b| a + b, &decomposition);
        assert!(matches!(
            result,
            Err(WarpackError::OutputTooSmall { required: 4, available: 3 })
        ));
    }
}
