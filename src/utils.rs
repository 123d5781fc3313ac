//! This module provides a set of shared, low-level utility functions used
//! by the block kernels.

use num_traits::PrimInt;

/// Splits `n` into `(n / d, n % d)` using a single division.
pub fn quotient_and_remainder<S: PrimInt>(n: S, d: S) -> (S, S) {
    let quotient = n / d;
    let remainder = n - d * quotient;
    (quotient, remainder)
}

/// Whether `ptr` sits on an `align`-byte boundary. `align` must be a power of two.
pub fn is_aligned_to<T>(ptr: *const T, align: usize) -> bool {
    debug_assert!(align.is_power_of_two());
    (ptr as usize) & (align - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotient_and_remainder() {
        assert_eq!(quotient_and_remainder(17usize, 8), (2, 1));
        assert_eq!(quotient_and_remainder(16u32, 8), (2, 0));
        assert_eq!(quotient_and_remainder(3u64, 8), (0, 3));
    }

    #[test]
    fn test_is_aligned_to() {
        let words = [0u64; 2];
        let base = words.as_ptr() as *const u8;
        assert!(is_aligned_to(base, 8));
        assert!(!is_aligned_to(base.wrapping_add(1), 8));
        assert!(is_aligned_to(base.wrapping_add(4), 4));
    }
}
