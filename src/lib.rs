//! This file is the root of the `warpack` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`context`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the public entry points, so callers can write
//!     `warpack::copy_if` rather than reaching into the module tree.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod config;
pub mod context;
pub mod decomposition;
pub mod error;
pub mod kernels;
pub mod mask;
pub mod memory;
pub mod traits;
pub mod utils;
pub mod view;

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use config::{BlockScheduling, ComputeCapability, LaunchConfig};
pub use context::{launch_closure, BlockKernel, ExecutionContext, SingleLaneContext};
pub use decomposition::{default_decomposition, IndexRange, UniformDecomposition};
pub use error::{Result, WarpackError};
pub use kernels::block_copy::{block_copy, select_copy_path, trivial_copy, CopyPath};
pub use kernels::block_scan::{inplace_inclusive_scan, inplace_inclusive_scan_n};
pub use kernels::copy_if::{copy_if, copy_if_unstenciled, remove_copy_if};
pub use kernels::reduce_intervals::reduce_intervals;
pub use kernels::scan::{inclusive_scan, inclusive_scan_in_place};
pub use mask::{compact_valid, copy_if_mask};
pub use memory::{SharedArray, TemporaryBuffer, UnsafeSlice};
pub use observability::enable_verbose_logging;
pub use traits::BlockElement;
pub use view::{IndexedSource, PredicateToIntegral};
