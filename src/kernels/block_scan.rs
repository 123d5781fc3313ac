//! Block-level inclusive scan over block-local memory.
//!
//! Hillis–Steele: `ceil(log2 n)` phases, each one a read, a barrier, a write and a
//! barrier. The only storage is the shared buffer itself plus one register per
//! lane. The combining operator is always applied as `op(left, right)`, so any
//! associative operator works, commutative or not, and any lane count works
//! without padding.

use crate::context::ExecutionContext;
use crate::memory::SharedArray;

/// Replaces slot `i` of `buffer` with `buffer[0] op buffer[1] op ... op buffer[i]`
/// for every `i < ctx.block_dimension()`.
///
/// # Safety
/// Every lane of the block must call this together, with the same buffer and
/// operator, after a barrier that ordered their previous writes to `buffer`.
/// No lane may touch `buffer` outside the call until it returns.
pub unsafe fn inplace_inclusive_scan<C, T, F>(ctx: &C, buffer: &SharedArray<T>, op: F)
where
    C: ExecutionContext,
    T: Copy + Default,
    F: Fn(T, T) -> T,
{
    inplace_inclusive_scan_n(ctx, buffer, ctx.block_dimension(), op)
}

/// Like [`inplace_inclusive_scan`], restricted to the first `n` slots.
///
/// Lanes at or past `n` still take every barrier. `n` must be the same on all
/// lanes and no larger than the block dimension or the buffer.
///
/// # Safety
/// Same contract as [`inplace_inclusive_scan`].
pub unsafe fn inplace_inclusive_scan_n<C, T, F>(ctx: &C, buffer: &SharedArray<T>, n: usize, op: F)
where
    C: ExecutionContext,
    T: Copy + Default,
    F: Fn(T, T) -> T,
{
    debug_assert!(n <= buffer.len() && n <= ctx.block_dimension());
    let lane = ctx.thread_index();

    let mut offset = 1;
    while offset < n {
        let partial = if lane >= offset && lane < n {
            Some(op(buffer.load(lane - offset), buffer.load(lane)))
        } else {
            None
        };
        ctx.barrier();

        if let Some(value) = partial {
            buffer.store(lane, value);
        }
        ctx.barrier();

        offset *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaunchConfig;
    use crate::context::{launch_closure, BlockKernel, SingleLaneContext};
    use crate::memory::UnsafeSlice;

    /// Loads `input`, scans the first `n` slots, stores the buffer to `output`.
    struct ScanKernel<'a, T, F> {
        input: &'a [T],
        output: UnsafeSlice<'a, T>,
        n: usize,
        op: F,
    }

    impl<T, F> BlockKernel for ScanKernel<'_, T, F>
    where
        T: Copy + Default + Send + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        type Shared = SharedArray<T>;

        fn shared(&self, block_dimension: usize) -> SharedArray<T> {
            SharedArray::new(block_dimension)
        }

        fn run<C: ExecutionContext>(&self, ctx: &C, sdata: &SharedArray<T>) {
            let lane = ctx.thread_index();
            unsafe {
                sdata.store(lane, self.input[lane]);
                ctx.barrier();
                inplace_inclusive_scan_n(ctx, sdata, self.n, &self.op);
                self.output.write(lane, sdata.load(lane));
            }
        }
    }

    fn run_scan<T, F>(input: &[T], n: usize, op: F) -> Vec<T>
    where
        T: Copy + Default + Send + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        let mut output = vec![T::default(); input.len()];
        let kernel = ScanKernel {
            input,
            output: UnsafeSlice::from(output.as_mut_slice()),
            n,
            op,
        };
        launch_closure(&LaunchConfig::default(), &kernel, 1, input.len()).unwrap();
        output
    }

    fn sequential_scan<T: Copy, F: Fn(T, T) -> T>(input: &[T], op: F) -> Vec<T> {
        let mut acc: Option<T> = None;
        input
            .iter()
            .map(|&x| {
                let next = match acc {
                    Some(a) => op(a, x),
                    None => x,
                };
                acc = Some(next);
                next
            })
            .collect()
    }

    #[test]
    fn test_scan_power_of_two_block() {
        let input: Vec<usize> = (1..=8).collect();
        let output = run_scan(&input, 8, |a, b| a + b);
        assert_eq!(output, vec![1, 3, 6, 10, 15, 21, 28, 36]);
    }

    #[test]
    fn test_scan_non_power_of_two_block() {
        let input = vec![1usize, 0, 1, 1, 0, 1, 1];
        let output = run_scan(&input, 7, |a, b| a + b);
        assert_eq!(output, vec![1, 1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn test_scan_non_commutative_operator() {
        // Affine maps x -> a*x + b composed left to right: associative, not commutative.
        let compose = |l: (i64, i64), r: (i64, i64)| (l.0 * r.0, l.1 * r.0 + r.1);
        let input: Vec<(i64, i64)> = vec![(2, 1), (3, -1), (1, 4), (-1, 2), (2, 0), (1, 1)];
        let output = run_scan(&input, input.len(), compose);
        assert_eq!(output, sequential_scan(&input, compose));
    }

    #[test]
    fn test_scan_first_n_leaves_tail_untouched() {
        let input = vec![1usize, 2, 3, 100, 200];
        let output = run_scan(&input, 3, |a, b| a + b);
        assert_eq!(output, vec![1, 3, 6, 100, 200]);
    }

    #[test]
    fn test_single_lane_scan_is_identity() {
        let ctx = SingleLaneContext::new();
        let buffer = SharedArray::<u32>::new(1);
        unsafe {
            buffer.store(0, 42);
            inplace_inclusive_scan(&ctx, &buffer, |a, b| a + b);
            assert_eq!(buffer.load(0), 42);
        }
    }
}
