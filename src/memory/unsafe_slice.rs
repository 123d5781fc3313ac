//! Global memory as seen from inside a kernel.
//!
//! Many lanes of many blocks write the same output buffer at the same time, each
//! at indices nobody else touches. `&mut [T]` cannot express that, so kernels
//! receive an `UnsafeSlice`: a copyable, shareable view whose element accesses
//! are `unsafe` and whose soundness rests on the kernel's index discipline.

use std::marker::PhantomData;
use std::ptr::NonNull;

/// A shared view of a mutable slice that lanes index without synchronization.
pub struct UnsafeSlice<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// The view hands out element accesses to many threads; callers uphold exclusivity per index.
unsafe impl<T: Send + Sync> Send for UnsafeSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for UnsafeSlice<'_, T> {}

impl<T> Clone for UnsafeSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for UnsafeSlice<'_, T> {}

impl<T> std::fmt::Debug for UnsafeSlice<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsafeSlice")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, T> From<&'a mut [T]> for UnsafeSlice<'a, T> {
    fn from(slice: &'a mut [T]) -> Self {
        Self {
            // A slice pointer is never null, even for an empty slice.
            ptr: NonNull::from(&mut *slice).cast(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }
}

impl<'a, T> UnsafeSlice<'a, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The view of elements `start..`, sharing the same underlying storage.
    ///
    /// # Panics
    /// If `start > self.len()`.
    pub fn offset(&self, start: usize) -> UnsafeSlice<'a, T> {
        assert!(
            start <= self.len,
            "offset {} out of range for UnsafeSlice of length {}",
            start,
            self.len
        );
        Self {
            // SAFETY: `start <= len`, so the result stays within (or one past) the allocation.
            ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(start)) },
            len: self.len - start,
            _marker: PhantomData,
        }
    }

    /// Reinterprets the start of this view as `len` elements of type `U`.
    ///
    /// # Safety
    /// The view's pointer must be aligned for `U`, `len * size_of::<U>()` must not
    /// exceed the view's size in bytes, and every bit pattern later written
    /// through the new view must be valid for `T`.
    pub unsafe fn cast<U>(&self, len: usize) -> UnsafeSlice<'a, U> {
        debug_assert!(len * std::mem::size_of::<U>() <= self.len * std::mem::size_of::<T>());
        debug_assert_eq!(self.ptr.as_ptr() as usize % std::mem::align_of::<U>(), 0);
        UnsafeSlice {
            ptr: self.ptr.cast(),
            len,
            _marker: PhantomData,
        }
    }

    /// Assigns `value` to element `index`, dropping the previous value.
    ///
    /// # Safety
    /// No other lane may read or write element `index` concurrently.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    pub unsafe fn write(&self, index: usize, value: T) {
        assert!(
            index < self.len,
            "write index {} out of range for UnsafeSlice of length {}",
            index,
            self.len
        );
        *self.ptr.as_ptr().add(index) = value;
    }
}
