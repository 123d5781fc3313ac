// In: src/error.rs

//! This module defines the single, unified error type for the entire warpack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Inputs to the primitives are assumed well-formed, so the taxonomy is small:
//! resource exhaustion, capacity checks done before any output is touched, and
//! fatal launch faults. A capability downgrade (e.g. no wide copy) is never an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarpackError {
    // =========================================================================
    // === Resource Errors
    // =========================================================================
    /// Temporary storage could not be provided. Always raised before any
    /// output storage has been written.
    #[error("Temporary allocation of {requested} elements ({element_size} bytes each) failed")]
    AllocationFailed { requested: usize, element_size: usize },

    #[error("Output buffer too small: {required} elements required, {available} available")]
    OutputTooSmall { required: usize, available: usize },

    #[error("Stencil shorter than input: input has {input} elements, stencil has {stencil}")]
    LengthMismatch { input: usize, stencil: usize },

    // =========================================================================
    // === Launch Errors (fatal, never retried at this layer)
    // =========================================================================
    #[error("Invalid launch configuration: {0}")]
    InvalidConfig(String),

    #[error("Kernel launch failed: {0}")]
    LaunchFailed(String),

    #[error("Kernel fault in block {block}: {message}")]
    KernelFault { block: usize, message: String },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while reading a launch config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, WarpackError>;
