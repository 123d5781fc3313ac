// In: src/config.rs

//! The single source of truth for how warpack launches work on the block machine.
//!
//! `LaunchConfig` is created once at the application boundary (in code, or from a
//! JSON document) and then passed by reference, or shared through an
//! `Arc<LaunchConfig>`, to every primitive. It carries the block geometry, the
//! emulated hardware capability and the scheduling policy for independent blocks.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpackError};

/// Hard upper bound on lanes per block, matching the widest real accelerators.
pub const MAX_THREADS_PER_BLOCK: usize = 1024;

/// Default number of lanes per block (`CTA_SIZE`).
///
/// Every lane is a host thread and every block barrier rendezvouses all of
/// them, so a block costs `threads_per_block` thread spawns plus one
/// hand-off per barrier. On hosts with few cores this dominates the run
/// time of large inputs; a block of 32 or 64 lanes is usually much faster
/// there and produces the same output.
pub const DEFAULT_THREADS_PER_BLOCK: usize = 256;

/// Blocks launched per multiprocessor when `max_blocks` is not given.
const BLOCKS_PER_MULTIPROCESSOR: usize = 10;

//==================================================================================
// I. Hardware Capability
//==================================================================================

/// The emulated hardware generation, as a `major.minor` capability level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

impl ComputeCapability {
    /// First generation whose global-memory addressing makes the wide
    /// trivial-copy path reliable.
    pub const WIDE_COPY_MINIMUM: ComputeCapability = ComputeCapability { major: 2, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether block copies may use vectorized wide-word transfers on this generation.
    pub fn supports_wide_copy(&self) -> bool {
        *self >= Self::WIDE_COPY_MINIMUM
    }
}

impl Default for ComputeCapability {
    fn default() -> Self {
        Self::new(7, 0)
    }
}

impl std::fmt::Display for ComputeCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

//==================================================================================
// II. Scheduling
//==================================================================================

/// How independent blocks of one launch are scheduled onto the host.
///
/// Every algorithm must produce identical results under all policies; the
/// non-parallel policies exist to make that property testable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockScheduling {
    /// **Default:** blocks run concurrently on the `rayon` pool.
    #[default]
    Parallel,
    /// Blocks run one at a time, in increasing block index order.
    Sequential,
    /// Blocks run one at a time, highest block index first.
    Reversed,
}

//==================================================================================
// III. The Unified LaunchConfig
//==================================================================================

/// The single, unified configuration for every launch performed by the library.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LaunchConfig {
    /// Lanes per block (`CTA_SIZE`). Also the chunk width of the compaction write pass.
    #[serde(default = "default_threads_per_block")]
    pub threads_per_block: usize,

    /// Number of emulated multiprocessors. Only used to derive `max_blocks`.
    #[serde(default = "default_multiprocessor_count")]
    pub multiprocessor_count: usize,

    /// Upper bound on blocks per launch. `None` means `10 * multiprocessor_count`.
    #[serde(default)]
    pub max_blocks: Option<usize>,

    /// The emulated hardware generation.
    #[serde(default)]
    pub compute_capability: ComputeCapability,

    /// Scheduling policy for independent blocks.
    #[serde(default)]
    pub scheduling: BlockScheduling,

    /// Optional cap on the bytes of a single temporary allocation. Requests above
    /// it fail with `AllocationFailed`, which is how resource exhaustion is modeled.
    #[serde(default)]
    pub temp_storage_limit_bytes: Option<usize>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            threads_per_block: default_threads_per_block(),
            multiprocessor_count: default_multiprocessor_count(),
            max_blocks: None,
            compute_capability: ComputeCapability::default(),
            scheduling: BlockScheduling::default(),
            temp_storage_limit_bytes: None,
        }
    }
}

impl LaunchConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LaunchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the block geometry. Called by every launch.
    pub fn validate(&self) -> Result<()> {
        if self.threads_per_block == 0 {
            return Err(WarpackError::InvalidConfig(
                "threads_per_block must be at least 1".to_string(),
            ));
        }
        if self.threads_per_block > MAX_THREADS_PER_BLOCK {
            return Err(WarpackError::InvalidConfig(format!(
                "threads_per_block {} exceeds the maximum of {}",
                self.threads_per_block, MAX_THREADS_PER_BLOCK
            )));
        }
        if self.multiprocessor_count == 0 {
            return Err(WarpackError::InvalidConfig(
                "multiprocessor_count must be at least 1".to_string(),
            ));
        }
        if self.max_blocks == Some(0) {
            return Err(WarpackError::InvalidConfig(
                "max_blocks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective upper bound on blocks per launch.
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
            .unwrap_or(BLOCKS_PER_MULTIPROCESSOR * self.multiprocessor_count)
    }

    pub fn with_threads_per_block(mut self, threads_per_block: usize) -> Self {
        self.threads_per_block = threads_per_block;
        self
    }

    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = Some(max_blocks);
        self
    }

    pub fn with_compute_capability(mut self, major: u32, minor: u32) -> Self {
        self.compute_capability = ComputeCapability::new(major, minor);
        self
    }

    pub fn with_scheduling(mut self, scheduling: BlockScheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn with_temp_storage_limit(mut self, bytes: usize) -> Self {
        self.temp_storage_limit_bytes = Some(bytes);
        self
    }
}

/// Helper for `serde` to provide a default for `threads_per_block`.
fn default_threads_per_block() -> usize {
    DEFAULT_THREADS_PER_BLOCK
}

/// Helper for `serde` to default the multiprocessor count to the host's parallelism.
fn default_multiprocessor_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

//==================================================================================
// IV. Unit Tests
//==================================================================================
