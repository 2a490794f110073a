//! Low-level blocking building blocks.
//!
//! Important: nothing here knows about payloads. This module provides the
//! platform wait/wake layer and the one-shot [`Gate`](sync::Gate) that the
//! cell types in [`crate::cell`] are built on.

pub mod sync;
