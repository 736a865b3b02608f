//! Router assembly for the demonstration host.
//!
//! # Middleware Stack
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │ Request Timeout  │ ← X-Request-Timeout stored as deadline
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ├──────────────► /health, /ready (never intercepted)
//!          ▼
//! ┌──────────────────┐
//! │   Maintenance    │ ← maintenance page while active
//! └────────┬─────────┘
//!          │
//!          ▼
//!     Application
//! ```

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{MaintenanceLayer, extract_request_timeout};
use crate::state::AppState;

/// Build the host router with the maintenance gate in front of the application.
///
/// The gate shares its state with `state.gate`; no second gate is built.
pub fn build_router(state: AppState) -> Router {
    let maintenance = MaintenanceLayer::from_gate(state.gate.clone());
    info!(gate = %state.gate.name(), "Maintenance layer installed");

    // Routes added after `.layer(maintenance)` are not wrapped by it
    Router::new()
        .fallback(handlers::application)
        .layer(maintenance)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(extract_request_timeout))
        .with_state(state)
}
