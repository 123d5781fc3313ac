// In: src/kernels/block_copy.rs

//! This module contains the block-cooperative bulk copy.
//!
//! All lanes of a block move a contiguous range together: lane `t` handles
//! items `t, t + T, t + 2T, ...` where `T` is the block dimension. For element
//! types that are trivially relocatable the copy runs over the raw byte image,
//! in 8-byte words when both ends are word aligned and byte by byte otherwise.
//! Everything else is cloned element by element.
//!
//! The copy has no barrier of its own. Callers that read the destination
//! afterwards from another lane must synchronize first.

use crate::context::ExecutionContext;
use crate::memory::UnsafeSlice;
use crate::traits::BlockElement;
use crate::utils::{is_aligned_to, quotient_and_remainder};

/// The double-width word used by the vectorized path.
pub type WideWord = u64;

pub const WIDE_WORD_BYTES: usize = std::mem::size_of::<WideWord>();

/// The strategy a block copy takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    /// Raw bytes, moved in `WideWord` units plus a byte-wise tail.
    Wide,
    /// Raw bytes, moved one at a time (an end is not word aligned).
    Bytewise,
    /// One clone-assign per element.
    Elementwise,
}

/// Decides how a block copy between `src` and `dst` is carried out.
pub fn select_copy_path<C: ExecutionContext>(
    ctx: &C,
    trivial: bool,
    src: *const u8,
    dst: *const u8,
) -> CopyPath {
    if !trivial || !ctx.supports_wide_copy() {
        CopyPath::Elementwise
    } else if is_aligned_to(src, WIDE_WORD_BYTES) && is_aligned_to(dst, WIDE_WORD_BYTES) {
        CopyPath::Wide
    } else {
        CopyPath::Bytewise
    }
}

//==================================================================================
// 1. Raw Byte Copy
//==================================================================================

/// Copies `src` into the first `src.len()` bytes of `dst` using every lane of the block.
///
/// # Safety
/// Every lane of the block must call this with the same arguments. No other lane
/// may access the destination bytes until the block has synchronized, and the
/// bytes written must form valid values of whatever type `dst` was viewed from.
///
/// # Panics
/// If `dst` is shorter than `src`.
pub unsafe fn trivial_copy<C: ExecutionContext>(ctx: &C, dst: UnsafeSlice<'_, u8>, src: &[u8]) {
    let num_bytes = src.len();
    assert!(
        dst.len() >= num_bytes,
        "trivial_copy of {} bytes into a destination of {}",
        num_bytes,
        dst.len()
    );

    let aligned = is_aligned_to(src.as_ptr(), WIDE_WORD_BYTES)
        && is_aligned_to(dst.as_ptr() as *const u8, WIDE_WORD_BYTES);
    if !aligned {
        strided_copy(ctx, dst, src);
        return;
    }

    let (wide_words, _remainder_bytes) = quotient_and_remainder(num_bytes, WIDE_WORD_BYTES);
    let wide_bytes = wide_words * WIDE_WORD_BYTES;

    let src_words: &[WideWord] = bytemuck::cast_slice(&src[..wide_bytes]);
    strided_copy(ctx, dst.cast::<WideWord>(wide_words), src_words);

    strided_copy(ctx, dst.offset(wide_bytes), &src[wide_bytes..]);
}

//==================================================================================
// 2. Typed Block Copy
//==================================================================================

/// Copies `src` to `dst[dst_first..dst_first + src.len()]` and returns the end of
/// the written region.
///
/// # Safety
/// Every lane of the block must call this with the same arguments, and no other
/// lane may access the destination range until the block has synchronized.
///
/// # Panics
/// If the destination range does not fit in `dst`.
pub unsafe fn block_copy<C, T>(ctx: &C, src: &[T], dst: UnsafeSlice<'_, T>, dst_first: usize) -> usize
where
    C: ExecutionContext,
    T: BlockElement,
{
    let n = src.len();
    let dst = dst.offset(dst_first);
    assert!(
        dst.len() >= n,
        "block_copy of {} elements past the end of the destination",
        n
    );

    let path = select_copy_path(
        ctx,
        T::TRIVIAL_COPY,
        src.as_ptr() as *const u8,
        dst.as_ptr() as *const u8,
    );
    if ctx.thread_index() == 0 {
        log::trace!("block {}: block_copy of {} elements via {:?}", ctx.block_index(), n, path);
    }

    match path {
        CopyPath::Elementwise => strided_copy(ctx, dst, src),
        CopyPath::Wide | CopyPath::Bytewise => {
            let num_bytes = std::mem::size_of_val(src);
            let src_bytes = std::slice::from_raw_parts(src.as_ptr() as *const u8, num_bytes);
            trivial_copy(ctx, dst.cast::<u8>(num_bytes), src_bytes);
        }
    }

    dst_first + n
}

/// Lane `t` copies items `t, t + T, ...`.
unsafe fn strided_copy<C, T>(ctx: &C, dst: UnsafeSlice<'_, T>, src: &[T])
where
    C: ExecutionContext,
    T: Clone,
{
    let stride = ctx.block_dimension();
    for i in (ctx.thread_index()..src.len()).step_by(stride) {
        dst.write(i, src[i].clone());
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaunchConfig;
    use crate::context::{launch_closure, BlockKernel, SingleLaneContext};

    struct CopyKernel<'a, T> {
        src: &'a [T],
        dst: UnsafeSlice<'a, T>,
        dst_first: usize,
    }

    impl<T: BlockElement> BlockKernel for CopyKernel<'_, T> {
        type Shared = ();

        fn shared(&self, _block_dimension: usize) -> Self::Shared {}

        fn run<C: ExecutionContext>(&self, ctx: &C, _shared: &Self::Shared) {
            let end = unsafe { block_copy(ctx, self.src, self.dst, self.dst_first) };
            assert_eq!(end, self.dst_first + self.src.len());
        }
    }

    fn launch_copy<T: BlockElement>(config: &LaunchConfig, src: &[T], dst: &mut [T], dst_first: usize) {
        let kernel = CopyKernel {
            src,
            dst: UnsafeSlice::from(dst),
            dst_first,
        };
        launch_closure(config, &kernel, 1, 8).unwrap();
    }

    /// 64 bytes of word-aligned storage.
    fn word_backed() -> Vec<u64> {
        vec![0u64; 8]
    }

    #[test]
    fn test_aligned_and_misaligned_bytes_copy_identically() {
        let payload: Vec<u8> = (0..37u8).map(|b| b.wrapping_mul(7).wrapping_add(3)).collect();
        let config = LaunchConfig::default();

        for (src_shift, dst_shift) in [(0, 0), (1, 0), (0, 3), (5, 5)] {
            let mut src_words = word_backed();
            let src_bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut src_words);
            src_bytes[src_shift..src_shift + payload.len()].copy_from_slice(&payload);
            let src = &src_bytes[src_shift..src_shift + payload.len()];

            let mut dst_words = word_backed();
            let dst_bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut dst_words);
            launch_copy(&config, src, &mut dst_bytes[dst_shift..], 0);

            assert_eq!(&dst_bytes[dst_shift..dst_shift + payload.len()], payload.as_slice());
            assert!(dst_bytes[..dst_shift].iter().all(|&b| b == 0));
            assert!(dst_bytes[dst_shift + payload.len()..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_typed_copy_at_offset() {
        let src: Vec<u32> = (100..120).collect();
        let mut dst = vec![0u32; 25];
        launch_copy(&LaunchConfig::default(), &src, &mut dst, 3);
        assert_eq!(&dst[..3], &[0, 0, 0]);
        assert_eq!(&dst[3..23], src.as_slice());
        assert_eq!(&dst[23..], &[0, 0]);
    }

    #[test]
    fn test_non_trivial_elements_are_cloned() {
        let src: Vec<String> = (0..11).map(|i| format!("item-{}", i)).collect();
        let mut dst = vec![String::new(); 11];
        launch_copy(&LaunchConfig::default(), &src, &mut dst, 0);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_old_capability_copies_elementwise() {
        let config = LaunchConfig::default().with_compute_capability(1, 3);
        let src: Vec<u16> = (0..30).collect();
        let mut dst = vec![0u16; 30];
        launch_copy(&config, &src, &mut dst, 0);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_select_copy_path() {
        let words = [0u64; 2];
        let aligned = words.as_ptr() as *const u8;
        let misaligned = aligned.wrapping_add(1);

        let ctx = SingleLaneContext::new();
        assert_eq!(select_copy_path(&ctx, true, aligned, aligned), CopyPath::Wide);
        assert_eq!(select_copy_path(&ctx, true, misaligned, aligned), CopyPath::Bytewise);
        assert_eq!(select_copy_path(&ctx, true, aligned, misaligned), CopyPath::Bytewise);
        assert_eq!(select_copy_path(&ctx, false, aligned, aligned), CopyPath::Elementwise);

        let old = SingleLaneContext::with_wide_copy(false);
        assert_eq!(select_copy_path(&old, true, aligned, aligned), CopyPath::Elementwise);
    }

    #[test]
    fn test_single_lane_copy_returns_end() {
        let ctx = SingleLaneContext::new();
        let src = [1.5f64, -2.0, 3.25];
        let mut dst = [0.0f64; 5];
        let end = unsafe { block_copy(&ctx, &src, UnsafeSlice::from(&mut dst[..]), 2) };
        assert_eq!(end, 5);
        assert_eq!(dst, [0.0, 0.0, 1.5, -2.0, 3.25]);
    }

    #[test]
    fn test_empty_copy_is_a_no_op() {
        let ctx = SingleLaneContext::new();
        let mut dst = [7u8; 4];
        let end = unsafe { block_copy(&ctx, &[] as &[u8], UnsafeSlice::from(&mut dst[..]), 4) };
        assert_eq!(end, 4);
        assert_eq!(dst, [7; 4]);
    }
}
