//! The execution context seen by code running on one lane of a block.
//!
//! `ExecutionContext` is a narrow capability interface: lane identity, block
//! identity, the block geometry, the barrier, and one hardware capability
//! query. Kernels are generic over it, so any emulated context can stand in for
//! the one the launcher provides.

pub mod barrier;
pub mod launch;

pub use barrier::{BarrierPoisoned, BlockBarrier};
pub use launch::{launch_closure, BlockKernel};

/// A view onto the calling lane's identity within the current launch.
pub trait ExecutionContext {
    /// Index of the calling lane within its block, in `0..block_dimension()`.
    fn thread_index(&self) -> usize;

    /// Index of the calling block within the launch, in `0..grid_dimension()`.
    fn block_index(&self) -> usize;

    /// Number of lanes per block.
    fn block_dimension(&self) -> usize;

    /// Number of blocks in the launch.
    fn grid_dimension(&self) -> usize;

    /// Blocks until every lane of the calling block has reached the barrier.
    ///
    /// Must be reached by all lanes of the block, the same number of times.
    fn barrier(&self);

    /// Whether wide-word trivial copies are reliable on this hardware generation.
    fn supports_wide_copy(&self) -> bool {
        true
    }
}

/// A block of exactly one lane, running on the calling thread.
///
/// With a single lane the barrier is trivially satisfied, so block-level
/// primitives can be driven directly without a launch.
#[derive(Debug, Clone, Copy)]
pub struct SingleLaneContext {
    supports_wide_copy: bool,
}

impl SingleLaneContext {
    pub fn new() -> Self {
        Self {
            supports_wide_copy: true,
        }
    }

    pub fn with_wide_copy(supports_wide_copy: bool) -> Self {
        Self { supports_wide_copy }
    }
}

impl Default for SingleLaneContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for SingleLaneContext {
    fn thread_index(&self) -> usize {
        0
    }

    fn block_index(&self) -> usize {
        0
    }

    fn block_dimension(&self) -> usize {
        1
    }

    fn grid_dimension(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn supports_wide_copy(&self) -> bool {
        self.supports_wide_copy
    }
}

/// The context the launcher hands to each lane.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub(crate) thread_index: usize,
    pub(crate) block_index: usize,
    pub(crate) block_dimension: usize,
    pub(crate) grid_dimension: usize,
    pub(crate) supports_wide_copy: bool,
    pub(crate) barrier: &'a BlockBarrier,
}

impl ExecutionContext for BlockContext<'_> {
    fn thread_index(&self) -> usize {
        self.thread_index
    }

    fn block_index(&self) -> usize {
        self.block_index
    }

    fn block_dimension(&self) -> usize {
        self.block_dimension
    }

    fn grid_dimension(&self) -> usize {
        self.grid_dimension
    }

    fn barrier(&self) {
        if self.barrier.wait().is_err() {
            // A sibling lane faulted. Unwind without invoking the panic hook; the
            // launcher recognises the payload and reports the original fault.
            std::panic::resume_unwind(Box::new(BarrierPoisoned));
        }
    }

    fn supports_wide_copy(&self) -> bool {
        self.supports_wide_copy
    }
}
