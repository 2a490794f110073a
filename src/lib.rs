//! # `palisade` - Protective Containers for Shared Mutable State
//!
//! Two generic containers wrap an arbitrary payload and expose the same
//! surface - `get`, `set`, and an atomic compound `mutate` - while providing
//! two deliberately different ordering guarantees under concurrency:
//!
//! - [`ConcurrentCell<T>`]: **mutual exclusion only**. All access runs under
//!   an internal word mutex; no update is ever lost, but operations submitted
//!   concurrently may complete in any order.
//! - [`SerializedCell<T>`]: **strict FIFO**. All access is funneled through
//!   one dedicated worker thread; operations execute one at a time in
//!   submission order, and each caller blocks until its own operation has
//!   fully run.
//!
//! The distinction is the whole point of the crate: the first guarantees
//! *cardinality* (N threads x M mutations apply exactly N*M times), the
//! second additionally guarantees *order* along a single submission path.
//!
//! ## Guarantees
//!
//! - **Atomic compound mutation**: `mutate` runs its transform as one
//!   indivisible critical section; no caller observes a partially-mutated
//!   payload.
//! - **Scoped release**: the lock (or queue slot) is released on every exit
//!   path, including unwinding. Neither container can silently end up
//!   permanently locked.
//! - **Pass-through transforms**: a transform's return value - or its panic -
//!   surfaces to the direct caller of `mutate`.
//!
//! ## Non-guarantees
//!
//! - No cancellation or timeouts; callers that need bounded waiting must
//!   wrap the call externally.
//! - Reentrant use (calling back into the same cell from inside a transform)
//!   deadlocks deterministically; it is documented misuse, never corruption.
//! - Cross-caller ordering on [`SerializedCell`] is arrival order at the
//!   queue, not a globally deterministic total order across unrelated
//!   threads.
//!
//! ## Architecture
//!
//! The crate is stratified: [`concurrency`] holds the platform wait/wake
//! layer (futex on Linux, `WaitOnAddress` on Windows) and a one-shot
//! completion gate; [`cell`] builds the two containers on top of it.
//!
//! ## Example
//!
//! ```rust
//! use palisade::ConcurrentCell;
//!
//! let counter = ConcurrentCell::new(0u64);
//!
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| {
//!             for _ in 0..1000 {
//!                 counter.mutate(|n| *n += 1);
//!             }
//!         });
//!     }
//! });
//!
//! assert_eq!(counter.get(), 4000);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cell;
pub mod concurrency;
pub mod timing;

pub use cell::{ConcurrentCell, ConcurrentGuard, SerializedCell};
pub use timing::Stopwatch;

// Compile-time layout assertions.
const _: () = {
    use core::mem;

    // The lock word plus payload must not grow beyond word alignment
    // padding; the cell is meant to be a drop-in for a plain variable.
    assert!(mem::size_of::<ConcurrentCell<u32>>() == mem::size_of::<u32>() * 2);

    // Guard is a single borrow.
    assert!(
        mem::size_of::<ConcurrentGuard<'static, u64>>() == mem::size_of::<&ConcurrentCell<u64>>()
    );
};
