//! Liveness and database reachability probe.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    /// `connected` or `unreachable`
    pub database: &'static str,

    pub timestamp: DateTime<Utc>,
}

/// `GET /health`
///
/// 200 when the repository answers a ping, 503 with `"degraded"` otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match state.repo.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed to reach database");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            timestamp: Utc::now(),
        }),
    )
}
