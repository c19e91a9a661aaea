//! Coordinator client for workers
//!
//! HTTP wrapper around the coordinator's admission surface. The server
//! never blocks a caller, so `acquire` here is the polling loop the
//! protocol expects from clients.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{BatchSyncError, Result};
use crate::server::StatusResponse;
use crate::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Configuration for the coordinator client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coordinator base address
    pub coordinator_addr: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Delay between acquire polls
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            coordinator_addr: "http://localhost:8080".into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Outcome of a single acquire probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Permit granted, the training step may run
    Granted,
    /// Coordinator asked us to keep polling
    Waiting,
}

/// Coordinator client for workers
pub struct CoordinatorClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl CoordinatorClient {
    /// Create a client for the configured coordinator
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BatchSyncError::ConnectionFailed {
                endpoint: config.coordinator_addr.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.coordinator_addr, path)
    }

    fn connection_failed(&self, err: reqwest::Error) -> BatchSyncError {
        BatchSyncError::ConnectionFailed {
            endpoint: self.config.coordinator_addr.clone(),
            reason: err.to_string(),
        }
    }

    async fn unexpected(response: reqwest::Response) -> BatchSyncError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        BatchSyncError::UnexpectedResponse { status, body }
    }

    /// Liveness probe
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("/ping"))
            .send()
            .await
            .map_err(|e| self.connection_failed(e))?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(Self::unexpected(response).await)
        }
    }

    /// Single admission probe, returns immediately
    pub async fn try_acquire(&self, client_id: &str) -> Result<Admission> {
        let response = self
            .http
            .get(self.url("/acquire"))
            .query(&[("clientId", client_id)])
            .send()
            .await
            .map_err(|e| self.connection_failed(e))?;

        match response.status() {
            StatusCode::OK => Ok(Admission::Granted),
            StatusCode::TOO_MANY_REQUESTS => Ok(Admission::Waiting),
            _ => Err(Self::unexpected(response).await),
        }
    }

    /// Poll until the coordinator admits `client_id`
    pub async fn acquire(&self, client_id: &str) -> Result<()> {
        loop {
            match self.try_acquire(client_id).await? {
                Admission::Granted => {
                    info!("Client {} admitted to batch", client_id);
                    return Ok(());
                }
                Admission::Waiting => {
                    debug!("Client {} waiting for batch slot", client_id);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Give back the permit after the training step
    pub async fn release(&self, client_id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/release"))
            .query(&[("clientId", client_id)])
            .send()
            .await
            .map_err(|e| self.connection_failed(e))?;

        match response.status() {
            StatusCode::OK => {
                info!("Client {} released permit", client_id);
                Ok(())
            }
            StatusCode::BAD_REQUEST => Err(BatchSyncError::ClientNotInBatch {
                client_id: client_id.to_owned(),
            }),
            _ => Err(Self::unexpected(response).await),
        }
    }

    /// Fetch the coordinator's state snapshot
    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self
            .http
            .get(self.url("/status"))
            .send()
            .await
            .map_err(|e| self.connection_failed(e))?;

        if response.status() != StatusCode::OK {
            return Err(Self::unexpected(response).await);
        }

        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| BatchSyncError::InvalidResponse {
                reason: e.to_string(),
            })
    }
}
