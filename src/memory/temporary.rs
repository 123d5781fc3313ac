//! Scoped temporary storage for algorithm calls.
//!
//! A `TemporaryBuffer` is allocated before an algorithm touches its output and
//! is released when it goes out of scope. Allocation is fallible: host
//! exhaustion and the configured `temp_storage_limit_bytes` both surface as
//! `WarpackError::AllocationFailed`.

use std::ops::{Deref, DerefMut};

use crate::config::LaunchConfig;
use crate::error::{Result, WarpackError};

#[derive(Debug)]
pub struct TemporaryBuffer<T> {
    data: Vec<T>,
}

impl<T: Clone + Default> TemporaryBuffer<T> {
    /// Allocates `len` default-initialized elements.
    pub fn allocate(config: &LaunchConfig, len: usize) -> Result<Self> {
        let element_size = std::mem::size_of::<T>();
        let failed = || WarpackError::AllocationFailed {
            requested: len,
            element_size,
        };

        let bytes = len.checked_mul(element_size).ok_or_else(failed)?;
        if let Some(limit) = config.temp_storage_limit_bytes {
            if bytes > limit {
                log::warn!(
                    "temporary allocation of {} bytes exceeds the configured limit of {} bytes",
                    bytes,
                    limit
                );
                return Err(failed());
            }
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| failed())?;
        data.resize(len, T::default());
        Ok(Self { data })
    }
}

impl<T> Deref for TemporaryBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for TemporaryBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let buffer = TemporaryBuffer::<usize>::allocate(&LaunchConfig::default(), 5).unwrap();
        assert_eq!(&buffer[..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_limit_is_enforced() {
        let config = LaunchConfig::default().with_temp_storage_limit(32);
        assert!(TemporaryBuffer::<u64>::allocate(&config, 4).is_ok());

        let result = TemporaryBuffer::<u64>::allocate(&config, 5);
        assert!(matches!(
            result,
            Err(WarpackError::AllocationFailed {
                requested: 5,
                element_size: 8
            })
        ));
    }

    #[test]
    fn test_overflowing_request_fails() {
        let result = TemporaryBuffer::<u64>::allocate(&LaunchConfig::default(), usize::MAX);
        assert!(matches!(result, Err(WarpackError::AllocationFailed { .. })));
    }
}
