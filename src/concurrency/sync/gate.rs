//! One-shot completion gate.

use core::sync::atomic::{AtomicU32, Ordering};
use crossbeam_utils::Backoff;

use super::{wait_on_u32, wake_all_u32};

/// A one-shot event: starts closed, opens exactly once, and releases every
/// waiter.
///
/// The open happens-before the return of any `wait`, so data written by the
/// opener before [`Gate::open`] is visible to waiters afterwards. A gate is
/// single-use; `open` on an already-open gate is a no-op.
pub struct Gate {
    state: AtomicU32,
}

impl Gate {
    const CLOSED: u32 = 0;
    const OPEN: u32 = 1;

    /// Creates a closed gate.
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(Self::CLOSED),
        }
    }

    /// Returns `true` once the gate has been opened.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == Self::OPEN
    }

    /// Opens the gate and wakes all waiters.
    #[inline]
    pub fn open(&self) {
        self.state.store(Self::OPEN, Ordering::Release);
        wake_all_u32(&self.state);
    }

    /// Blocks until the gate is open.
    ///
    /// Spins briefly before parking; the expected wait is one short critical
    /// section on another thread.
    pub fn wait(&self) {
        let backoff = Backoff::new();
        while !self.is_open() {
            if backoff.is_completed() {
                wait_on_u32(&self.state, Self::CLOSED);
            } else {
                backoff.snooze();
            }
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
