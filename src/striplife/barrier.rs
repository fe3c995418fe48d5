//! Cyclic barrier with a terminal action and fail-fast breakage.
//!
//! The last of `parties` arrivals runs the action while still holding the
//! barrier lock, bumps the cycle, and wakes everyone. Because every waiter
//! re-acquires the same lock before returning, writes made before `wait`
//! happen-before the action, and the action happens-before every return.
//!
//! Once broken (a party gave up, or the action panicked) the barrier stays
//! broken: current and future waiters get [`BarrierError::Broken`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::error::panic_message;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BarrierError {
    #[error("barrier is broken")]
    Broken,
    /// Returned to the party that ran the action; the others see `Broken`.
    #[error("barrier action panicked: {0}")]
    ActionPanicked(String),
}

/// Outcome of a successful [`CyclicBarrier::wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierWaitResult {
    is_leader: bool,
    cycle: u64,
}

impl BarrierWaitResult {
    /// True for the party that arrived last and ran the action.
    #[inline]
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// The cycle this wait completed, starting at 0.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

struct BarrierState<A> {
    arrived: usize,
    cycle: u64,
    broken: bool,
    action: A,
}

pub struct CyclicBarrier<A> {
    parties: usize,
    state: Mutex<BarrierState<A>>,
    released: Condvar,
}

impl CyclicBarrier<fn()> {
    /// Barrier without a terminal action.
    pub fn plain(parties: usize) -> Self {
        fn noop() {}
        Self::new(parties, noop as fn())
    }
}

impl<A: FnMut()> CyclicBarrier<A> {
    /// # Panics
    ///
    /// Panics if `parties` is 0.
    pub fn new(parties: usize, action: A) -> Self {
        assert!(parties > 0, "barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                cycle: 0,
                broken: false,
                action,
            }),
            released: Condvar::new(),
        }
    }

    #[inline]
    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn is_broken(&self) -> bool {
        self.lock().broken
    }

    /// Number of completed cycles.
    pub fn cycle(&self) -> u64 {
        self.lock().cycle
    }

    // The action runs under catch_unwind, so nothing panics while the lock is
    // held and a poisoned lock still carries consistent state.
    fn lock(&self) -> MutexGuard<'_, BarrierState<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arrive and block until all parties have arrived or the barrier breaks.
    pub fn wait(&self) -> Result<BarrierWaitResult, BarrierError> {
        let mut state = self.lock();
        if state.broken {
            return Err(BarrierError::Broken);
        }

        let cycle = state.cycle;
        state.arrived += 1;

        if state.arrived == self.parties {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (state.action)()));
            if let Err(payload) = outcome {
                state.broken = true;
                drop(state);
                self.released.notify_all();
                return Err(BarrierError::ActionPanicked(panic_message(payload.as_ref())));
            }
            state.arrived = 0;
            state.cycle = cycle.wrapping_add(1);
            drop(state);
            self.released.notify_all();
            return Ok(BarrierWaitResult {
                is_leader: true,
                cycle,
            });
        }

        while state.cycle == cycle && !state.broken {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.cycle == cycle {
            return Err(BarrierError::Broken);
        }
        Ok(BarrierWaitResult {
            is_leader: false,
            cycle,
        })
    }

    /// Mark the barrier broken and wake every waiter.
    pub fn break_barrier(&self) {
        let mut state = self.lock();
        state.broken = true;
        drop(state);
        self.released.notify_all();
    }
}

impl<A> fmt::Debug for CyclicBarrier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CyclicBarrier")
            .field("parties", &self.parties)
            .field("arrived", &state.arrived)
            .field("cycle", &state.cycle)
            .field("broken", &state.broken)
            .finish_non_exhaustive()
    }
}
