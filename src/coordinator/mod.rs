//! Coordinator for batch admission
//!
//! Queues clients, forms fixed-size batches, and tracks releases.

pub mod admission;

pub use admission::{AcquireOutcome, BatchCoordinator, CoordinatorSnapshot, WaitReason};
