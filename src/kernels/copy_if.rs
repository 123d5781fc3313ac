// In: src/kernels/copy_if.rs

//! This module contains the parallel stream-compaction engine.
//!
//! `copy_if` packs every element whose stencil value satisfies a predicate into
//! the front of the output, in original order. It runs as two launches over the
//! same decomposition, joined on the host:
//!
//! 1.  **Count:** every block reduces its interval of the lazy 0/1 predicate
//!     view into one count.
//! 2.  **Offsets:** the per-block counts are inclusive-scanned on the host, so
//!     block `b` starts writing at the total of blocks `0..b`.
//! 3.  **Write:** every block walks its interval in chunks of one element per
//!     lane, block-scans the chunk's predicate values and scatters the selected
//!     elements. A fully selected chunk is moved with a single `block_copy`.
//!
//! All temporary storage is allocated and the output capacity is checked before
//! the write launch, so a failed call never leaves partially written output.

use crate::config::LaunchConfig;
use crate::context::{launch_closure, BlockKernel, ExecutionContext};
use crate::decomposition::{default_decomposition, UniformDecomposition};
use crate::error::{Result, WarpackError};
use crate::kernels::block_copy::block_copy;
use crate::kernels::block_scan::inplace_inclusive_scan;
use crate::kernels::reduce_intervals::reduce_intervals;
use crate::kernels::scan::inclusive_scan_in_place;
use crate::memory::{SharedArray, TemporaryBuffer, UnsafeSlice};
use crate::traits::BlockElement;
use crate::view::{IndexedSource, PredicateToIntegral};

//==================================================================================
// 1. Public API
//==================================================================================

/// Copies every `input[i]` for which `pred(&stencil[i])` holds to the front of
/// `output`, preserving order, and returns how many elements were written.
///
/// The stencil may be longer than the input; only its first `input.len()`
/// values are consulted. Elements of `output` past the returned count are left
/// untouched.
///
/// # Errors
/// * `LengthMismatch` if the stencil is shorter than the input.
/// * `AllocationFailed` if the per-block count buffer cannot be allocated.
/// * `OutputTooSmall` if `output` cannot hold every selected element.
/// * `InvalidConfig`, `LaunchFailed` or `KernelFault` from the launches.
///
/// # Example
/// ```
/// use warpack::{copy_if, LaunchConfig};
///
/// let config = LaunchConfig::default().with_threads_per_block(2);
/// let input = [5, 1, 4, 2, 8];
/// let stencil = [1, 3, 6, 0, 7];
/// let mut output = [0; 5];
/// let end = copy_if(&config, &input, &stencil, &mut output, |s: &i32| s % 2 == 0).unwrap();
/// assert_eq!(&output[..end], &[4, 2]);
/// ```
pub fn copy_if<T, S, P>(
    config: &LaunchConfig,
    input: &[T],
    stencil: &[S],
    output: &mut [T],
    pred: P,
) -> Result<usize>
where
    T: BlockElement,
    S: Sync,
    P: Fn(&S) -> bool + Sync,
{
    if stencil.len() < input.len() {
        return Err(WarpackError::LengthMismatch {
            input: input.len(),
            stencil: stencil.len(),
        });
    }
    let stencil = &stencil[..input.len()];
    let flags: PredicateToIntegral<_, _, usize> = PredicateToIntegral::new(stencil, pred);
    copy_if_by_source(config, input, &flags, output)
}

/// `copy_if` with the input serving as its own stencil.
pub fn copy_if_unstenciled<T, P>(
    config: &LaunchConfig,
    input: &[T],
    output: &mut [T],
    pred: P,
) -> Result<usize>
where
    T: BlockElement,
    P: Fn(&T) -> bool + Sync,
{
    copy_if(config, input, input, output, pred)
}

/// Copies the elements whose stencil value does *not* satisfy `pred`.
pub fn remove_copy_if<T, S, P>(
    config: &LaunchConfig,
    input: &[T],
    stencil: &[S],
    output: &mut [T],
    pred: P,
) -> Result<usize>
where
    T: BlockElement,
    S: Sync,
    P: Fn(&S) -> bool + Sync,
{
    copy_if(config, input, stencil, output, move |s: &S| !pred(s))
}

//==================================================================================
// 2. The Two-Pass Driver
//==================================================================================

/// Compacts `input` by a 0/1 flag view of the same length.
pub(crate) fn copy_if_by_source<T, V>(
    config: &LaunchConfig,
    input: &[T],
    flags: &V,
    output: &mut [T],
) -> Result<usize>
where
    T: BlockElement,
    V: IndexedSource<Item = usize>,
{
    let n = input.len();
    if n == 0 {
        return Ok(0);
    }
    debug_assert_eq!(flags.len(), n);
    config.validate()?;

    let decomposition = default_decomposition(n, config);
    let mut block_offsets = TemporaryBuffer::<usize>::allocate(config, decomposition.len())?;

    // --- Pass 1: per-block predicate counts ---
    reduce_intervals(config, flags, &mut block_offsets, |a, b| a + b, &decomposition)?;

    // --- Pass 2: counts -> inclusive offsets ---
    inclusive_scan_in_place(&mut block_offsets, |a, b| a + b);
    let count = block_offsets.last().copied().unwrap_or(0);

    if output.len() < count {
        return Err(WarpackError::OutputTooSmall {
            required: count,
            available: output.len(),
        });
    }

    // --- Pass 3: scatter ---
    let kernel = CopyIfIntervals {
        input,
        flags,
        block_offsets: &block_offsets[..],
        output: UnsafeSlice::from(output),
        decomposition: &decomposition,
    };
    launch_closure(config, &kernel, decomposition.len(), config.threads_per_block)?;

    log::debug!(
        "copy_if: selected {} of {} elements across {} blocks",
        count,
        n,
        decomposition.len()
    );
    log_metric!(
        "event" = "copy_if",
        "elements" = &n,
        "blocks" = &decomposition.len(),
        "selected" = &count
    );
    Ok(count)
}

//==================================================================================
// 3. The Write Kernel
//==================================================================================

struct CopyIfIntervals<'a, T, V> {
    input: &'a [T],
    flags: &'a V,
    block_offsets: &'a [usize],
    output: UnsafeSlice<'a, T>,
    decomposition: &'a UniformDecomposition,
}

impl<T, V> BlockKernel for CopyIfIntervals<'_, T, V>
where
    T: BlockElement,
    V: IndexedSource<Item = usize>,
{
    type Shared = SharedArray<usize>;

    fn shared(&self, block_dimension: usize) -> SharedArray<usize> {
        SharedArray::new(block_dimension)
    }

    fn run<C: ExecutionContext>(&self, ctx: &C, sdata: &SharedArray<usize>) {
        let lane = ctx.thread_index();
        let cta_size = ctx.block_dimension();
        let block = ctx.block_index();
        let interval = self.decomposition.interval(block);

        let mut out_first = if block == 0 {
            0
        } else {
            self.block_offsets[block - 1]
        };
        let mut base = interval.begin;

        // Full chunks.
        while base + cta_size <= interval.end {
            let i = base + lane;
            let flag = self.flags.at(i);

            // SAFETY: block `b` only writes `[block_offsets[b - 1], block_offsets[b])`,
            // and each chunk only writes `[out_first, out_first + chunk_count)`. Inside
            // a chunk a selected lane writes slot `out_first + scan[lane] - 1`, which is
            // unique because the inclusive scan strictly increases at every selected
            // lane; the dense path hands each lane its own strided elements. `sdata` is
            // stored before the barrier and read only after it.
            unsafe {
                sdata.store(lane, flag);
                ctx.barrier();
                inplace_inclusive_scan(ctx, sdata, |a, b| a + b);

                let chunk_count = sdata.load(cta_size - 1);
                if chunk_count == cta_size {
                    block_copy(ctx, &self.input[base..base + cta_size], self.output, out_first);
                } else if flag != 0 {
                    self.output
                        .write(out_first + sdata.load(lane) - 1, self.input[i].clone());
                }
                out_first += chunk_count;
            }
            ctx.barrier();

            base += cta_size;
        }

        // Partial chunk: lanes past the interval hold 0 and never touch the input.
        if base < interval.end {
            let i = base + lane;
            let in_range = i < interval.end;
            let flag = if in_range { self.flags.at(i) } else { 0 };

            // SAFETY: as for a full chunk; out-of-range lanes carry a 0 flag and write nothing.
            unsafe {
                sdata.store(lane, flag);
                ctx.barrier();
                inplace_inclusive_scan(ctx, sdata, |a, b| a + b);

                if in_range && flag != 0 {
                    self.output
                        .write(out_first + sdata.load(lane) - 1, self.input[i].clone());
                }
            }
        }
    }
}
