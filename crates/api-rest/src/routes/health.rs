//! Health check endpoints.

use crate::{responses::ApiResponse, state::AppState};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Store connectivity
    pub store: StoreCheck,
}

/// Result of pinging the store
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCheck {
    /// Whether the store answered
    pub healthy: bool,

    /// Round-trip latency in milliseconds
    pub latency_ms: u64,

    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

/// Basic health check
async fn health() -> Json<ApiResponse<HealthResponse>> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(response))
}

/// Readiness check against the store
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<ReadinessResponse>>) {
    let store = match state.store.health_check().await {
        Ok(status) => StoreCheck {
            healthy: status.healthy,
            latency_ms: status.latency.as_millis() as u64,
            error: status.error,
        },
        Err(e) => StoreCheck {
            healthy: false,
            latency_ms: 0,
            error: Some(e.to_string()),
        },
    };

    let ready = store.healthy;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ApiResponse::success(ReadinessResponse { ready, store })))
}
