//! Worker service binary
//!
//! Demo training client: polls the coordinator for admission, simulates
//! a training step, releases its slot, and repeats for the configured
//! number of rounds.

use std::sync::Arc;
use std::time::Duration;

use batchsync_core::worker::{ClientConfig, CoordinatorClient, WorkerPhase, WorkerState};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting BatchSync Worker");

    // Load configuration from environment
    let coordinator_addr =
        std::env::var("COORDINATOR_ADDR").unwrap_or_else(|_| "http://localhost:8080".into());
    let client_id =
        std::env::var("CLIENT_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());
    let rounds: u64 = std::env::var("TRAINING_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let step_millis: u64 = std::env::var("STEP_DURATION_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1000);

    let config = ClientConfig {
        coordinator_addr: coordinator_addr.clone(),
        ..Default::default()
    };
    let client = CoordinatorClient::new(config)?;

    info!("Checking coordinator at {}", coordinator_addr);
    if let Err(e) = client.ping().await {
        error!("Coordinator unreachable: {}", e);
        return Err(e.into());
    }

    let state = Arc::new(WorkerState::new(client_id));
    info!("Worker running as client {}", state.client_id());

    while state.rounds_completed() < rounds {
        state.set_phase(WorkerPhase::Waiting).await;
        client.acquire(state.client_id()).await?;
        state.set_phase(WorkerPhase::Admitted).await;

        // Simulated training step
        tokio::time::sleep(Duration::from_millis(step_millis)).await;

        client.release(state.client_id()).await?;
        state.set_phase(WorkerPhase::Idle).await;

        let done = state.complete_round();
        info!("Completed round {}/{}", done, rounds);
    }

    info!("All {} rounds complete", rounds);
    Ok(())
}
