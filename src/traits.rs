//! This module defines the element trait shared by the block kernels.
//!
//! `BlockElement` is the trivial-copy eligibility trait: it tells a block copy
//! whether elements may be relocated through their raw byte image (the wide,
//! alignment-aware path) or must be cloned one by one because the type carries
//! its own copy semantics.

/// An element that block kernels can move between global memory locations.
///
/// # Safety
/// An implementation that sets `TRIVIAL_COPY = true` promises that the type is
/// plain old data: every byte of its representation is initialized (no padding),
/// it has no drop glue and no user-defined `Clone` behaviour, so copying its raw
/// bytes produces a valid value equal to `clone()`. Types that cannot promise
/// this must keep the default `false`.
pub unsafe trait BlockElement: Clone + Send + Sync {
    /// Whether the raw-memory copy path may be used for this type.
    const TRIVIAL_COPY: bool = false;
}

/// Marks types as trivially relocatable.
///
/// Only use this for types that satisfy the `BlockElement` safety contract.
#[macro_export]
macro_rules! impl_trivial_copy {
    ($($T:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::traits::BlockElement for $T {
                const TRIVIAL_COPY: bool = true;
            }
        )+
    };
}

impl_trivial_copy!(u8, u16, u32, u64, u128, usize);
impl_trivial_copy!(i8, i16, i32, i64, i128, isize);
impl_trivial_copy!(f32, f64, bool, char);

// Arrays inherit the policy of their element type; an array of POD has no padding.
unsafe impl<T: BlockElement, const N: usize> BlockElement for [T; N] {
    const TRIVIAL_COPY: bool = T::TRIVIAL_COPY;
}

// Owned strings have a user-visible clone (heap duplication), never a raw copy.
unsafe impl BlockElement for String {}
