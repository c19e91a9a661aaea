//! Error types for BatchSync
//!
//! Covers coordination protocol errors and worker-client transport
//! failures. "Must wait" is not an error: it is an ordinary
//! [`AcquireOutcome`](crate::coordinator::AcquireOutcome).

use thiserror::Error;

/// Primary error type for all BatchSync operations
#[derive(Debug, Error)]
pub enum BatchSyncError {
    // ========== Coordination Errors ==========

    /// Client released a permit it does not hold
    #[error("Client {client_id} was not in the training batch")]
    ClientNotInBatch { client_id: String },

    // ========== Transport Errors (worker client) ==========

    /// Connection to the coordinator failed
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Coordinator answered with a status outside the protocol
    #[error("Unexpected response from coordinator: {status} {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Invalid response body: {reason}")]
    InvalidResponse { reason: String },
}

impl BatchSyncError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, BatchSyncError::ConnectionFailed { .. })
    }

    /// Returns true if this error signals a caller protocol violation
    pub fn is_caller_error(&self) -> bool {
        matches!(self, BatchSyncError::ClientNotInBatch { .. })
    }
}

/// Result type alias for BatchSync operations
pub type Result<T> = std::result::Result<T, BatchSyncError>;
