//! Block-local ("shared") memory.
//!
//! A `SharedArray` lives for one block of a launch and is visible to all of its
//! lanes. Accesses are unsynchronized; lanes separate conflicting accesses with
//! the block barrier, exactly as on real hardware.

use std::cell::UnsafeCell;

/// Fast block-scoped memory, initialized with `T::default()`.
pub struct SharedArray<T> {
    cells: Box<[UnsafeCell<T>]>,
}

// Lanes of one block share the array; the barrier discipline makes accesses race-free.
unsafe impl<T: Send> Sync for SharedArray<T> {}

impl<T: Copy + Default> SharedArray<T> {
    pub fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| UnsafeCell::new(T::default())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads slot `index`.
    ///
    /// # Safety
    /// No lane may write slot `index` between the last barrier and the next one.
    pub unsafe fn load(&self, index: usize) -> T {
        *self.cells[index].get()
    }

    /// Writes slot `index`.
    ///
    /// # Safety
    /// No other lane may read or write slot `index` between the last barrier and
    /// the next one.
    pub unsafe fn store(&self, index: usize, value: T) {
        *self.cells[index].get() = value;
    }
}

impl<T: Copy + Default + std::fmt::Debug> std::fmt::Debug for SharedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedArray")
            .field("len", &self.len())
            .finish()
    }
}
