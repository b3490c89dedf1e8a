//! Request logging middleware.
//!
//! Each request runs inside an `http_request` span carrying its request ID,
//! so events logged by handlers and the leaderboard engine are correlated.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    middleware::Next,
};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::RequestId;

/// Log one line per completed request, graded by status class.
fn log_outcome(status: StatusCode, elapsed_ms: u64) {
    if status.is_server_error() {
        error!(status = %status, duration_ms = elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        warn!(status = %status, duration_ms = elapsed_ms, "Request rejected");
    } else {
        info!(status = %status, duration_ms = elapsed_ms, "Request completed");
    }
}

/// Middleware for logging HTTP requests and responses
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or("unknown");

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let start = Instant::now();
        debug!(query = req.uri().query().unwrap_or(""), "Incoming request");

        let response = next.run(req).await;
        log_outcome(response.status(), start.elapsed().as_millis() as u64);
        response
    }
    .instrument(span)
    .await
}
