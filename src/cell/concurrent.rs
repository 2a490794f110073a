//! `ConcurrentCell` — lock-guarded shared mutable state.

use core::cell::UnsafeCell;
use core::fmt;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};
use crossbeam_utils::Backoff;

use crate::concurrency::sync::{wait_on_u32, wake_one_u32};

/// A mutual-exclusion container for a value of type `T`.
///
/// All access runs under an internal word mutex: reads, writes, and compound
/// [`mutate`](ConcurrentCell::mutate) calls are indivisible with respect to
/// each other, but operations submitted concurrently from different threads
/// may complete in **any order**. If you need submission-order execution,
/// use [`SerializedCell`](crate::SerializedCell).
///
/// # Lock states
/// - 0: Unlocked
/// - 1: Locked, no waiters (likely)
/// - 2: Locked, waiters exist (contended)
///
/// # Panics and poisoning
/// The lock is never poisoned. A transform that panics unwinds through the
/// caller of `mutate`; the guard releases the lock on every exit path, and
/// the payload keeps whatever state the transform reached before panicking.
///
/// # Reentrancy
/// The mutex is not reentrant. Calling any method of the same cell from
/// inside a `mutate` transform deadlocks that thread deterministically.
pub struct ConcurrentCell<T> {
    state: AtomicU32,
    value: UnsafeCell<T>,
}

// Safety: the word mutex grants exclusive access to `value`; a snapshot
// taken under the lock is the only way `&T` escapes a guard's lifetime.
unsafe impl<T: Send> Send for ConcurrentCell<T> {}
unsafe impl<T: Send> Sync for ConcurrentCell<T> {}

impl<T> ConcurrentCell<T> {
    const UNLOCKED: u32 = 0;
    const LOCKED: u32 = 1;
    const CONTENDED: u32 = 2;

    /// Creates a cell holding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            state: AtomicU32::new(Self::UNLOCKED),
            value: UnsafeCell::new(value),
        }
    }

    /// Consumes the cell and returns the payload.
    ///
    /// No locking is needed: `self` is owned, so no other thread can hold
    /// the lock.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Returns a mutable reference to the payload without locking.
    ///
    /// `&mut self` proves exclusive access statically.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Acquires the lock, blocking the calling thread until it is available.
    #[inline]
    pub fn lock(&self) -> ConcurrentGuard<'_, T> {
        if self
            .state
            .compare_exchange(
                Self::UNLOCKED,
                Self::LOCKED,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            return ConcurrentGuard { cell: self };
        }
        self.lock_slow()
    }

    #[cold]
    fn lock_slow(&self) -> ConcurrentGuard<'_, T> {
        // Spin while the lock looks close to free.
        let backoff = Backoff::new();
        while !backoff.is_completed() {
            if self.state.load(Ordering::Relaxed) == Self::UNLOCKED
                && self
                    .state
                    .compare_exchange(
                        Self::UNLOCKED,
                        Self::LOCKED,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    )
                    .is_ok()
            {
                return ConcurrentGuard { cell: self };
            }
            backoff.snooze();
        }

        // Waiter phase. From here on the word must stay CONTENDED whenever
        // any waiter might remain parked, so every acquisition goes through
        // swap(CONTENDED) and every unlock of a contended word wakes the
        // next waiter. Taking a free lock this way over-marks it contended,
        // which only costs one spurious wake at unlock.
        while self.state.swap(Self::CONTENDED, Ordering::Acquire) != Self::UNLOCKED {
            wait_on_u32(&self.state, Self::CONTENDED);
        }
        ConcurrentGuard { cell: self }
    }

    fn unlock(&self) {
        if self.state.swap(Self::UNLOCKED, Ordering::Release) == Self::CONTENDED {
            wake_one_u32(&self.state);
        }
    }

    /// Applies `transform` to the payload under the lock.
    ///
    /// The read, the in-place mutation, and the write-back are a single
    /// critical section; no other caller can observe an intermediate state.
    /// The transform's return value passes through to the caller.
    #[inline]
    pub fn mutate<R>(&self, transform: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        transform(&mut *guard)
    }

    /// Replaces the payload, returning the previous value.
    #[inline]
    pub fn replace(&self, value: T) -> T {
        self.mutate(|slot| core::mem::replace(slot, value))
    }

    /// Replaces the payload.
    #[inline]
    pub fn set(&self, value: T) {
        self.mutate(|slot| *slot = value);
    }
}

impl<T: Clone> ConcurrentCell<T> {
    /// Returns a consistent snapshot of the payload.
    ///
    /// Blocks only for the lock acquisition plus the clone.
    #[inline]
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

impl<T: Default> Default for ConcurrentCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for ConcurrentCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ConcurrentCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConcurrentCell").field(&self.get()).finish()
    }
}

/// RAII guard for [`ConcurrentCell`]; releases the lock on drop, including
/// during unwinding.
pub struct ConcurrentGuard<'a, T> {
    cell: &'a ConcurrentCell<T>,
}

impl<T> Deref for ConcurrentGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // Safety: the guard witnesses lock ownership.
        unsafe { &*self.cell.value.get() }
    }
}

impl<T> DerefMut for ConcurrentGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard witnesses lock ownership.
        unsafe { &mut *self.cell.value.get() }
    }
}

impl<T> Drop for ConcurrentGuard<'_, T> {
    fn drop(&mut self) {
        self.cell.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn lock_excludes() {
        let cell = ConcurrentCell::new(0u32);
        let cell = &cell;

        thread::scope(|s| {
            s.spawn(move || {
                let mut guard = cell.lock();
                thread::sleep(Duration::from_millis(50));
                *guard += 1;
            });

            s.spawn(move || {
                thread::sleep(Duration::from_millis(10));
                // Blocks until the first thread releases.
                let mut guard = cell.lock();
                *guard += 1;
            });
        });

        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn guard_deref() {
        let cell = ConcurrentCell::new(vec![1, 2, 3]);
        {
            let mut guard = cell.lock();
            guard.push(4);
        }
        assert_eq!(cell.lock().len(), 4);
    }

    #[test]
    fn mutate_passes_result_through() {
        let cell = ConcurrentCell::new(String::from("ab"));
        let len = cell.mutate(|s| {
            s.push('c');
            s.len()
        });
        assert_eq!(len, 3);
    }

    #[test]
    fn replace_returns_old() {
        let cell = ConcurrentCell::new(7);
        assert_eq!(cell.replace(9), 7);
        assert_eq!(cell.get(), 9);
    }
}
