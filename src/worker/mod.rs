//! Worker-side pieces
//!
//! HTTP client for talking to the coordinator and the local
//! per-client lifecycle state.

pub mod client;
pub mod state;

pub use client::{Admission, ClientConfig, CoordinatorClient};
pub use state::{WorkerPhase, WorkerState};
