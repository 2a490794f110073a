//! `SerializedCell` — strictly ordered shared mutable state.

use core::cell::UnsafeCell;
use core::fmt;
use core::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::concurrency::sync::Gate;

/// An operation shipped to the worker, erased over its captures.
type Op<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// A serial-executor container for a value of type `T`.
///
/// Every operation is enqueued to one dedicated worker thread that owns the
/// payload, and the caller blocks until its own operation has fully run.
/// This is stronger than mutual exclusion: operations execute one at a time
/// **in submission order**. A single thread performing M `mutate` calls sees
/// them applied strictly in program order; across independently scheduled
/// threads, the order is their arrival order at the queue, which is only as
/// deterministic as the callers' own scheduling.
///
/// Contrast with [`ConcurrentCell`](crate::ConcurrentCell), which guarantees
/// mutual exclusion but lets concurrent operations complete in any order.
///
/// # Panics
/// A transform that panics is caught on the worker and the panic resumes in
/// the submitting caller. The worker and the queue stay usable; the payload
/// keeps whatever state the transform reached before panicking.
///
/// # Reentrancy
/// Submitting an operation to a cell from inside one of its own transforms
/// deadlocks deterministically: the worker is busy running the transform and
/// can never reach the nested operation.
pub struct SerializedCell<T: Send + 'static> {
    sender: Option<mpsc::Sender<Op<T>>>,
    worker: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> SerializedCell<T> {
    /// Creates a cell holding `value` and spawns its worker thread.
    pub fn new(value: T) -> Self {
        let (sender, receiver) = mpsc::channel::<Op<T>>();
        let worker = thread::Builder::new()
            .name("palisade-serialized".into())
            .spawn(move || Self::run_worker(value, &receiver))
            .expect("failed to spawn serialized worker");
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Worker loop: applies operations in arrival order until every sender
    /// is gone, then hands the payload back through the join handle.
    fn run_worker(mut value: T, receiver: &mpsc::Receiver<Op<T>>) -> T {
        #[cfg(feature = "tracing")]
        tracing::trace!("serialized worker started");
        while let Ok(op) = receiver.recv() {
            op(&mut value);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!("serialized worker stopping");
        value
    }

    /// Applies `transform` to the payload on the worker thread, blocking the
    /// caller until the result is committed.
    ///
    /// The transform's return value (or panic) passes through to the caller.
    pub fn mutate<R: Send>(&self, transform: impl FnOnce(&mut T) -> R + Send) -> R {
        let completion = Arc::new(Completion::<R>::new());
        let remote = Arc::clone(&completion);
        let op: Box<dyn FnOnce(&mut T) + Send + '_> = Box::new(move |value: &mut T| {
            remote.fill(panic::catch_unwind(AssertUnwindSafe(|| transform(value))));
        });
        // Safety: erasing the lifetime is sound because this call blocks on
        // the gate until the worker has finished running the operation, so
        // everything it borrows from this stack frame outlives its use. The
        // completion itself is kept alive past the gate-open by the worker's
        // own Arc. If the send fails the operation never left this frame.
        let op: Op<T> = unsafe { mem::transmute(op) };
        self.sender
            .as_ref()
            .expect("serialized worker already shut down")
            .send(op)
            .expect("serialized worker exited");
        completion.wait();
        match completion.take_outcome() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Replaces the payload.
    pub fn set(&self, value: T) {
        self.mutate(move |slot| *slot = value);
    }

    /// Replaces the payload, returning the previous value.
    pub fn replace(&self, value: T) -> T {
        self.mutate(move |slot| mem::replace(slot, value))
    }

    /// Shuts the worker down and returns the payload.
    pub fn into_inner(mut self) -> T {
        drop(self.sender.take());
        let worker = self.worker.take().expect("serialized worker already joined");
        match worker.join() {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<T: Clone + Send + 'static> SerializedCell<T> {
    /// Returns a snapshot of the payload, taken in queue order.
    pub fn get(&self) -> T {
        self.mutate(|value| value.clone())
    }
}

impl<T: Default + Send + 'static> Default for SerializedCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Send + 'static> From<T> for SerializedCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + fmt::Debug + Send + 'static> fmt::Debug for SerializedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerializedCell").field(&self.get()).finish()
    }
}

impl<T: Send + 'static> Drop for SerializedCell<T> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit; all
        // submissions are synchronous, so nothing can still be queued.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Per-operation rendezvous: the worker stores the outcome and opens the
/// gate; the blocked caller then takes it.
struct Completion<R> {
    gate: Gate,
    slot: UnsafeCell<Option<thread::Result<R>>>,
}

// Safety: the worker writes the slot exactly once before opening the gate
// and never touches it again; the caller reads it only after `wait`
// returns. The gate's release/acquire pair orders the two.
unsafe impl<R: Send> Sync for Completion<R> {}

impl<R> Completion<R> {
    fn new() -> Self {
        Self {
            gate: Gate::new(),
            slot: UnsafeCell::new(None),
        }
    }

    fn fill(&self, outcome: thread::Result<R>) {
        // Safety: single writer, pre-open; see the Sync justification.
        unsafe {
            *self.slot.get() = Some(outcome);
        }
        self.gate.open();
    }

    fn wait(&self) {
        self.gate.wait();
    }

    fn take_outcome(&self) -> thread::Result<R> {
        debug_assert!(self.gate.is_open());
        // Safety: the gate is open, so the worker is done with the slot and
        // this caller is its only remaining user.
        unsafe { (*self.slot.get()).take() }.expect("completion gate opened without an outcome")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutate_passes_result_through() {
        let cell = SerializedCell::new(10u64);
        let doubled = cell.mutate(|v| {
            *v *= 2;
            *v
        });
        assert_eq!(doubled, 20);
        assert_eq!(cell.get(), 20);
    }

    #[test]
    fn into_inner_returns_payload() {
        let cell = SerializedCell::new(vec![1u8, 2]);
        cell.mutate(|v| v.push(3));
        assert_eq!(cell.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn drop_joins_worker() {
        let cell = SerializedCell::new(0usize);
        cell.set(5);
        drop(cell);
    }

    #[test]
    fn mutate_borrows_from_caller_stack() {
        let cell = SerializedCell::new(Vec::new());
        let local = [1, 2, 3];
        cell.mutate(|v: &mut Vec<i32>| v.extend_from_slice(&local));
        assert_eq!(cell.get(), vec![1, 2, 3]);
    }
}
