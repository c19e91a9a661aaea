//! HTTP transport for the batch coordinator
//!
//! Thin glue only: handlers map coordinator decisions onto the wire
//! contract (200 granted, 429 must-wait, 400 bad release) and never hold
//! state of their own.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::coordinator::{AcquireOutcome, BatchCoordinator, WaitReason};
use crate::metrics;

/// Query parameters shared by acquire and release
#[derive(Debug, Deserialize)]
pub struct ClientIdParams {
    #[serde(rename = "clientId")]
    pub client_id: String,
}

/// JSON body of `GET /status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// "idle" or "batch_active"
    pub state: String,
    /// Clients queued for the next batch, FIFO order
    pub waiting: Vec<String>,
    /// Members of the active batch
    pub batch: Vec<String>,
}

/// Build the coordinator's HTTP router
pub fn router(coordinator: Arc<BatchCoordinator>) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/acquire", get(acquire_handler))
        .route("/release", post(release_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(coordinator)
}

async fn ping_handler() -> &'static str {
    "PONG"
}

async fn acquire_handler(
    State(coordinator): State<Arc<BatchCoordinator>>,
    Query(params): Query<ClientIdParams>,
) -> impl IntoResponse {
    match coordinator.acquire(&params.client_id).await {
        AcquireOutcome::Granted => (StatusCode::OK, "Permission granted"),
        AcquireOutcome::Wait(WaitReason::BatchInProgress) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Training in progress, waiting for next batch",
        ),
        AcquireOutcome::Wait(WaitReason::AwaitingPeers) => {
            (StatusCode::TOO_MANY_REQUESTS, "Waiting for another client")
        }
    }
}

async fn release_handler(
    State(coordinator): State<Arc<BatchCoordinator>>,
    Query(params): Query<ClientIdParams>,
) -> impl IntoResponse {
    match coordinator.release(&params.client_id).await {
        Ok(()) => (StatusCode::OK, "Permission released"),
        Err(_) => (StatusCode::BAD_REQUEST, "Client was not in training batch."),
    }
}

async fn status_handler(
    State(coordinator): State<Arc<BatchCoordinator>>,
) -> Json<StatusResponse> {
    let snapshot = coordinator.snapshot().await;
    let state = if snapshot.is_idle() {
        "idle"
    } else {
        "batch_active"
    };
    Json(StatusResponse {
        state: state.to_string(),
        waiting: snapshot.waiting,
        batch: snapshot.batch,
    })
}

async fn metrics_handler() -> String {
    metrics::gather_system_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = router(Arc::new(BatchCoordinator::new()));

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "PONG");
    }

    #[tokio::test]
    async fn test_acquire_without_client_id_is_rejected() {
        let app = router(Arc::new(BatchCoordinator::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/acquire")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let app = router(Arc::new(BatchCoordinator::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("batchsync_acquire_requests_total"));
        assert!(body.contains("batchsync_batch_occupancy"));
    }
}
