//! Batch admission state machine
//!
//! Clients queue FIFO until enough of them accumulate to form a batch;
//! the whole batch is admitted at once and each member frees its slot
//! with an explicit release. All decisions happen under one lock and
//! return immediately - waiting clients are expected to poll.

use std::collections::{HashSet, VecDeque};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BatchSyncError, Result};
use crate::metrics;
use crate::BATCH_SIZE;

/// Decision returned by [`BatchCoordinator::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Client is a member of the active batch and may proceed
    Granted,
    /// Client must keep polling
    Wait(WaitReason),
}

/// Why an acquire call did not grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// A batch is in progress and the client is not part of it
    BatchInProgress,
    /// No batch is running yet; too few clients have queued up
    AwaitingPeers,
}

/// Read-only view of the coordinator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    /// Clients queued for the next batch, in FIFO order
    pub waiting: Vec<String>,
    /// Members of the active batch, sorted for stable output
    pub batch: Vec<String>,
}

impl CoordinatorSnapshot {
    /// True when no batch is in progress
    pub fn is_idle(&self) -> bool {
        self.batch.is_empty()
    }
}

/// Containers owned by the coordinator, only touched under its lock
struct AdmissionState {
    waiting: VecDeque<String>,
    batch: HashSet<String>,
}

impl AdmissionState {
    /// Append the client unless it is already queued
    fn enqueue(&mut self, client_id: &str) -> bool {
        if self.waiting.iter().any(|c| c == client_id) {
            return false;
        }
        self.waiting.push_back(client_id.to_owned());
        true
    }

    /// Move the batch-size front of the queue into the batch
    fn form_batch(&mut self) {
        while self.batch.len() < BATCH_SIZE {
            match self.waiting.pop_front() {
                Some(client) => {
                    self.batch.insert(client);
                }
                None => break,
            }
        }
    }

    fn publish_gauges(&self) {
        metrics::standard::WAITING_CLIENTS.set(self.waiting.len() as i64);
        metrics::standard::BATCH_OCCUPANCY.set(self.batch.len() as i64);
    }
}

/// Admits clients to coordinated training rounds in fixed-size batches
///
/// A single instance owns the waiting queue and the active batch for the
/// process lifetime. Both `acquire` and `release` are serialized through
/// one mutex, so no two calls can observe a half-formed batch.
pub struct BatchCoordinator {
    state: Mutex<AdmissionState>,
}

impl BatchCoordinator {
    /// Create a coordinator with empty queue and batch
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AdmissionState {
                waiting: VecDeque::new(),
                batch: HashSet::new(),
            }),
        }
    }

    /// Request admission for `client_id`
    ///
    /// Returns immediately with the decision; callers poll until granted.
    /// Batch formation only ever happens here, atomically with the
    /// enqueue that triggered it.
    pub async fn acquire(&self, client_id: &str) -> AcquireOutcome {
        metrics::standard::ACQUIRE_REQUESTS.inc();
        let mut state = self.state.lock().await;

        // Already admitted: re-confirm without touching any container
        if state.batch.contains(client_id) {
            debug!("Client {} is already in the current batch", client_id);
            return AcquireOutcome::Granted;
        }

        // Batch in progress: register for the next one
        if !state.batch.is_empty() {
            if state.enqueue(client_id) {
                info!(
                    "Client {} queued for next batch, queue depth {}",
                    client_id,
                    state.waiting.len()
                );
            }
            state.publish_gauges();
            return AcquireOutcome::Wait(WaitReason::BatchInProgress);
        }

        // Idle: queue up, and form a batch once enough clients arrived
        state.enqueue(client_id);
        info!(
            "Client {} requested permission, queue depth {}",
            client_id,
            state.waiting.len()
        );

        if state.waiting.len() >= BATCH_SIZE {
            state.form_batch();
            metrics::standard::BATCHES_FORMED.inc();
            info!("New batch started with clients: {:?}", state.batch);
        }

        let outcome = if state.batch.contains(client_id) {
            AcquireOutcome::Granted
        } else {
            AcquireOutcome::Wait(WaitReason::AwaitingPeers)
        };
        state.publish_gauges();
        outcome
    }

    /// Give back the permit held by `client_id`
    ///
    /// Never forms a batch; an emptied batch only makes the coordinator
    /// eligible to start the next one on a later acquire.
    pub async fn release(&self, client_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        if !state.batch.remove(client_id) {
            warn!(
                "Client {} attempted to release a permit it does not hold",
                client_id
            );
            return Err(BatchSyncError::ClientNotInBatch {
                client_id: client_id.to_owned(),
            });
        }

        metrics::standard::PERMITS_RELEASED.inc();
        info!(
            "Client {} released permission, batch size now {}",
            client_id,
            state.batch.len()
        );
        if state.batch.is_empty() {
            info!("Batch completed, ready for the next one");
        }
        state.publish_gauges();
        Ok(())
    }

    /// Capture the current queue and batch membership
    pub async fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.state.lock().await;
        let mut batch: Vec<String> = state.batch.iter().cloned().collect();
        batch.sort();
        CoordinatorSnapshot {
            waiting: state.waiting.iter().cloned().collect(),
            batch,
        }
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_enqueue_ignored() {
        let coordinator = BatchCoordinator::new();

        assert_eq!(
            coordinator.acquire("a").await,
            AcquireOutcome::Wait(WaitReason::AwaitingPeers)
        );
        assert_eq!(
            coordinator.acquire("a").await,
            AcquireOutcome::Wait(WaitReason::AwaitingPeers)
        );

        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.waiting, vec!["a"]);
        assert!(snapshot.is_idle());
    }

    #[tokio::test]
    async fn test_batch_forms_at_threshold() {
        let coordinator = BatchCoordinator::new();

        coordinator.acquire("a").await;
        coordinator.acquire("b").await;
        assert_eq!(coordinator.acquire("c").await, AcquireOutcome::Granted);

        let snapshot = coordinator.snapshot().await;
        assert!(snapshot.waiting.is_empty());
        assert_eq!(snapshot.batch, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_release_non_member_is_error() {
        let coordinator = BatchCoordinator::new();

        let err = coordinator.release("ghost").await.unwrap_err();
        assert!(err.is_caller_error());
        assert!(coordinator.snapshot().await.is_idle());
    }
}
