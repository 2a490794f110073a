//! The two protective containers.
//!
//! The module tree is intentionally stratified:
//! - [`crate::concurrency`] holds the minimal blocking building blocks.
//! - `cell::*` are the ergonomic, payload-owning containers built on them.
//!
//! Both containers expose the same surface (`get`/`set`/`mutate`) and differ
//! only in the ordering guarantee: [`ConcurrentCell`] gives mutual exclusion,
//! [`SerializedCell`] gives strict submission-order execution.

pub mod concurrent;
pub mod serialized;

#[cfg(feature = "serde")]
mod serde_impls;

pub use concurrent::{ConcurrentCell, ConcurrentGuard};
pub use serialized::SerializedCell;
