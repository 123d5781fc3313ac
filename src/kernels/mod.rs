//! This module contains the block kernels and the algorithms built from them.
//!
//! Block-level primitives (`block_scan`, `block_copy`) are called by every lane
//! of a block from inside a kernel. The host-level algorithms (`copy_if`,
//! `reduce_intervals`, `scan`) allocate, launch and return results.

pub mod block_copy;
pub mod block_scan;
pub mod copy_if;
pub mod reduce_intervals;
pub mod scan;
