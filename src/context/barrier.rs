//! The block barrier: the only suspension point exposed to kernel code.
//!
//! A generation-counting barrier over `Mutex` + `Condvar`. Unlike
//! `std::sync::Barrier` it can be poisoned: when one lane of a block faults,
//! every lane waiting on (or later arriving at) the barrier is released with
//! `BarrierPoisoned` instead of blocking forever.
//!
//! Waiters yield for a bounded number of rounds before parking on the condvar.
//! Most phases of a block kernel are short, so the last lane usually arrives
//! while the others are still yielding and nobody pays for a futex wake-up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Yield rounds a waiter spends before it parks.
const SPIN_LIMIT: usize = 64;

/// Returned by `BlockBarrier::wait` once the barrier has been poisoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierPoisoned;

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

/// A reusable rendezvous for exactly `threads` lanes.
#[derive(Debug)]
pub struct BlockBarrier {
    threads: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
    // Lock-free mirrors of `state.generation` and `state.poisoned`, written
    // under the lock and read by spinning waiters.
    generation: AtomicU64,
    poisoned: AtomicBool,
}

impl BlockBarrier {
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                poisoned: false,
            }),
            released: Condvar::new(),
            generation: AtomicU64::new(0),
            poisoned: AtomicBool::new(false),
        }
    }

    /// Blocks until all `threads` lanes have arrived in the current generation.
    ///
    /// Every write a lane made before arriving is visible to every lane after
    /// the barrier opens: arrivals are ordered by the mutex, and the last lane
    /// publishes the new generation with `Release`.
    pub fn wait(&self) -> Result<(), BarrierPoisoned> {
        let mut state = self.lock();
        if state.poisoned {
            return Err(BarrierPoisoned);
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.threads {
            // Last to arrive: open the barrier and start the next generation.
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.generation.store(state.generation, Ordering::Release);
            self.released.notify_all();
            return Ok(());
        }
        drop(state);

        for _ in 0..SPIN_LIMIT {
            if self.generation.load(Ordering::Acquire) != generation {
                return Ok(());
            }
            if self.poisoned.load(Ordering::Acquire) {
                break;
            }
            thread::yield_now();
        }

        let mut state = self.lock();
        while state.generation == generation && !state.poisoned {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.generation == generation {
            Err(BarrierPoisoned)
        } else {
            Ok(())
        }
    }

    /// Releases all current and future waiters with `BarrierPoisoned`.
    pub fn poison(&self) {
        let mut state = self.lock();
        state.poisoned = true;
        self.poisoned.store(true, Ordering::Release);
        self.released.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        // The state is a pair of counters, consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_single_lane_barrier_never_blocks() {
        let barrier = BlockBarrier::new(1);
        for _ in 0..3 {
            assert_eq!(barrier.wait(), Ok(()));
        }
    }

    #[test]
    fn test_barrier_orders_phases() {
        let lanes = 8;
        let barrier = BlockBarrier::new(lanes);
        let arrived = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..lanes {
                s.spawn(|| {
                    arrived.fetch_add(1, Ordering::Relaxed);
                    barrier.wait().unwrap();
                    // Nobody passes the barrier before everyone has arrived.
                    assert_eq!(arrived.load(Ordering::Relaxed), lanes);
                    barrier.wait().unwrap();
                });
            }
        });
    }

    #[test]
    fn test_poison_releases_waiters() {
        let barrier = BlockBarrier::new(3);
        thread::scope(|s| {
            let waiter = s.spawn(|| barrier.wait());
            // Give the waiter a chance to block, then poison instead of arriving.
            thread::sleep(std::time::Duration::from_millis(20));
            barrier.poison();
            assert_eq!(waiter.join().unwrap(), Err(BarrierPoisoned));
        });
        // Poisoning is sticky: a later arrival fails immediately.
        assert_eq!(barrier.wait(), Err(BarrierPoisoned));
    }

    #[test]
    fn test_many_back_to_back_phases() {
        let lanes = 16;
        let phases = 200;
        let barrier = BlockBarrier::new(lanes);
        let counters: Vec<AtomicUsize> = (0..phases).map(|_| AtomicUsize::new(0)).collect();

        thread::scope(|s| {
            for _ in 0..lanes {
                s.spawn(|| {
                    for (phase, counter) in counters.iter().enumerate() {
                        counter.fetch_add(1, Ordering::Relaxed);
                        barrier.wait().unwrap();
                        assert_eq!(counter.load(Ordering::Relaxed), lanes, "phase {}", phase);
                    }
                });
            }
        });
    }

    #[test]
    fn test_poison_releases_spinning_waiters() {
        let barrier = BlockBarrier::new(4);
        thread::scope(|s| {
            let waiters: Vec<_> = (0..3).map(|_| s.spawn(|| barrier.wait())).collect();
            barrier.poison();
            for waiter in waiters {
                // A waiter either saw the poison or arrived after it.
                assert_eq!(waiter.join().unwrap(), Err(BarrierPoisoned));
            }
        });
    }
}
