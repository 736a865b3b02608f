//! Health and readiness endpoints.
//!
//! Both are mounted outside the maintenance layer, so they keep answering
//! while every other route shows the maintenance page.
//!
//! - `GET /health` - Status details including whether maintenance is active
//! - `GET /ready` - Kubernetes-compatible readiness probe

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// `maintenance_active` reflects the local check only (enabled flag, trigger
/// URL presence, source file presence); the trigger endpoint is not probed.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "maintenance_active": false,
///   "gate": "app",
///   "uptime_seconds": 3600,
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        maintenance_active: state.gate.is_maintenance_active().await,
        gate: state.gate.name().to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint for Kubernetes probes.
///
/// Maintenance mode does not make the instance unready: it must stay in the
/// load balancer to serve the maintenance page.
#[instrument]
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
