//! Worker lifecycle state
//!
//! Tracks where a client stands in the admission cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Where the client stands in the admission cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Not asking for admission
    Idle,
    /// Polling the coordinator for a slot
    Waiting,
    /// Member of the active batch, running its training step
    Admitted,
}

/// Local worker state
pub struct WorkerState {
    /// Identifier this worker acquires and releases under
    client_id: String,
    /// Current phase
    phase: RwLock<WorkerPhase>,
    /// Completed training rounds
    rounds_completed: AtomicU64,
}

impl WorkerState {
    /// Create state for a client id
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            phase: RwLock::new(WorkerPhase::Idle),
            rounds_completed: AtomicU64::new(0),
        }
    }

    /// Client id used on the wire
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get current phase
    pub async fn phase(&self) -> WorkerPhase {
        *self.phase.read().await
    }

    /// Set phase
    pub async fn set_phase(&self, phase: WorkerPhase) {
        *self.phase.write().await = phase;
    }

    /// Completed round count
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Relaxed)
    }

    /// Record a finished round, returning the new total
    pub fn complete_round(&self) -> u64 {
        self.rounds_completed.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_phase_transitions() {
        let state = WorkerState::new("w-1");
        assert_eq!(state.phase().await, WorkerPhase::Idle);

        state.set_phase(WorkerPhase::Waiting).await;
        state.set_phase(WorkerPhase::Admitted).await;
        assert_eq!(state.phase().await, WorkerPhase::Admitted);

        assert_eq!(state.complete_round(), 1);
        assert_eq!(state.rounds_completed(), 1);
    }
}
