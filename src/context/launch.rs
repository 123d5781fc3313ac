//! The kernel launch facility.
//!
//! `launch_closure` runs a `BlockKernel` once per lane across a grid of blocks
//! and returns only after every block has completed. Each block is emulated by
//! `threads_per_block` scoped OS threads that share the block's barrier and the
//! block-local memory produced by `BlockKernel::shared`. Blocks are independent
//! and are scheduled according to `LaunchConfig::scheduling`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::thread;

use rayon::prelude::*;

use crate::config::{BlockScheduling, LaunchConfig, MAX_THREADS_PER_BLOCK};
use crate::context::barrier::{BarrierPoisoned, BlockBarrier};
use crate::context::{BlockContext, ExecutionContext};
use crate::error::{Result, WarpackError};

/// Stack reserved for each emulated lane. Kernels are shallow, non-recursive loops.
const LANE_STACK_BYTES: usize = 512 * 1024;

//==================================================================================
// 1. The Kernel Contract
//==================================================================================

/// A kernel body executed by every lane of every block in a launch.
pub trait BlockKernel: Sync {
    /// Block-local memory, created once per block and shared by its lanes.
    type Shared: Sync;

    /// Builds the block-local memory for a block of `block_dimension` lanes.
    fn shared(&self, block_dimension: usize) -> Self::Shared;

    /// The per-lane body.
    fn run<C: ExecutionContext>(&self, ctx: &C, shared: &Self::Shared);
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    grid_dimension: usize,
    block_dimension: usize,
    supports_wide_copy: bool,
}

//==================================================================================
// 2. Public Launch API
//==================================================================================

/// Executes `kernel` on a `num_blocks` x `threads_per_block` grid and waits for it.
///
/// A launch with zero blocks does nothing. A lane panic is fatal for the
/// launch and is reported as `KernelFault`; a lane that could not be spawned is
/// reported as `LaunchFailed`. Neither is retried.
pub fn launch_closure<K: BlockKernel>(
    config: &LaunchConfig,
    kernel: &K,
    num_blocks: usize,
    threads_per_block: usize,
) -> Result<()> {
    config.validate()?;
    if threads_per_block == 0 || threads_per_block > MAX_THREADS_PER_BLOCK {
        return Err(WarpackError::InvalidConfig(format!(
            "cannot launch {} threads per block (allowed 1..={})",
            threads_per_block, MAX_THREADS_PER_BLOCK
        )));
    }
    if num_blocks == 0 {
        return Ok(());
    }

    let geometry = Geometry {
        grid_dimension: num_blocks,
        block_dimension: threads_per_block,
        supports_wide_copy: config.compute_capability.supports_wide_copy(),
    };

    log::debug!(
        "launch: {} blocks x {} threads ({:?}, capability {})",
        num_blocks,
        threads_per_block,
        config.scheduling,
        config.compute_capability
    );

    let run = |block_index: usize| run_block(kernel, geometry, block_index);
    match config.scheduling {
        BlockScheduling::Parallel => (0..num_blocks).into_par_iter().try_for_each(run),
        BlockScheduling::Sequential => (0..num_blocks).try_for_each(run),
        BlockScheduling::Reversed => (0..num_blocks).rev().try_for_each(run),
    }
}

//==================================================================================
// 3. Private Block Emulation
//==================================================================================

fn run_block<K: BlockKernel>(kernel: &K, geometry: Geometry, block_index: usize) -> Result<()> {
    let shared = kernel.shared(geometry.block_dimension);
    let barrier = BlockBarrier::new(geometry.block_dimension);
    let fault: OnceLock<String> = OnceLock::new();

    let spawn_error = thread::scope(|scope| {
        for thread_index in 0..geometry.block_dimension {
            let ctx = BlockContext {
                thread_index,
                block_index,
                block_dimension: geometry.block_dimension,
                grid_dimension: geometry.grid_dimension,
                supports_wide_copy: geometry.supports_wide_copy,
                barrier: &barrier,
            };
            let (shared, barrier, fault) = (&shared, &barrier, &fault);

            let spawned = thread::Builder::new()
                .name(format!("warpack-b{}-t{}", block_index, thread_index))
                .stack_size(LANE_STACK_BYTES)
                .spawn_scoped(scope, move || run_lane(kernel, &ctx, shared, barrier, fault));

            if let Err(e) = spawned {
                // Lanes already started are parked at the start rendezvous; release them.
                barrier.poison();
                return Some(e);
            }
        }
        None
    });

    if let Some(e) = spawn_error {
        return Err(WarpackError::LaunchFailed(format!(
            "block {}: could not spawn lane thread: {}",
            block_index, e
        )));
    }
    if let Some(message) = fault.into_inner() {
        log::debug!("launch: block {} faulted: {}", block_index, message);
        return Err(WarpackError::KernelFault {
            block: block_index,
            message,
        });
    }
    Ok(())
}

fn run_lane<K: BlockKernel>(
    kernel: &K,
    ctx: &BlockContext<'_>,
    shared: &K::Shared,
    barrier: &BlockBarrier,
    fault: &OnceLock<String>,
) {
    // Start rendezvous: no lane runs until the whole block exists.
    if barrier.wait().is_err() {
        return;
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| kernel.run(ctx, shared)));
    if let Err(payload) = outcome {
        barrier.poison();
        if payload.downcast_ref::<BarrierPoisoned>().is_none() {
            let _ = fault.set(panic_message(payload.as_ref()));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "lane panicked with a non-string payload".to_string()
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
