// --- IN: src/mask.rs ---

//! This module contains compaction driven by a packed validity bitmap.
//!
//! A set bit keeps the element, a clear bit drops it. The bitmap is read in
//! place through `IndexedSource`, one bit per lane, so it is never unpacked
//! into a byte-per-element stencil.

use bitvec::prelude::*;

use crate::config::LaunchConfig;
use crate::error::{Result, WarpackError};
use crate::kernels::copy_if::copy_if_by_source;
use crate::traits::BlockElement;
use crate::view::IndexedSource;

impl<'a> IndexedSource for &'a BitSlice<u8, Lsb0> {
    type Item = bool;

    fn len(&self) -> usize {
        <BitSlice<u8, Lsb0>>::len(self)
    }

    fn at(&self, index: usize) -> bool {
        self[index]
    }
}

//==================================================================================
// 1. Public API
//==================================================================================

/// Copies every `input[i]` whose bit `i` is set in `mask` to the front of
/// `output`, preserving order, and returns how many elements were written.
///
/// Bits past `input.len()` are ignored.
pub fn copy_if_mask<T: BlockElement>(
    config: &LaunchConfig,
    input: &[T],
    mask: &BitSlice<u8, Lsb0>,
    output: &mut [T],
) -> Result<usize> {
    if mask.len() < input.len() {
        return Err(WarpackError::LengthMismatch {
            input: input.len(),
            stencil: mask.len(),
        });
    }
    let mask = &mask[..input.len()];
    let flags = IndexedSource::map(mask, |bit: bool| bit as usize);
    copy_if_by_source(config, input, &flags, output)
}

/// Extracts the valid values into a new, dense `Vec`.
pub fn compact_valid<T>(
    config: &LaunchConfig,
    values: &[T],
    validity: &BitSlice<u8, Lsb0>,
) -> Result<Vec<T>>
where
    T: BlockElement + Default,
{
    let valid = validity[..values.len().min(validity.len())].count_ones();
    let mut dense = vec![T::default(); valid];
    let written = copy_if_mask(config, values, validity, &mut dense)?;
    debug_assert_eq!(written, valid);
    Ok(dense)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
