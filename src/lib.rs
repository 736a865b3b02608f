//! # Maintenance Gate
//!
//! A Tower / Axum middleware that puts a service into maintenance mode:
//! while maintenance is live, callers receive a maintenance page (read from a
//! file or fetched from a URL) instead of reaching the wrapped service.
//!
//! - **Toggling without restarts**: create/remove the page file, or stand up /
//!   tear down a trigger endpoint that answers `200 OK`
//! - **Whitelisting**: CIDR ranges whose callers always reach the service
//! - **Bounded upstream calls**: one pooled HTTP client with a configurable
//!   timeout, tightened further by a client's `X-Request-Timeout`
//! - **Observability**: structured logs and Prometheus counters per decision
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  MaintenanceLayer / MaintenanceService (tower adapter)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MaintenanceGate (active? → trigger? → whitelisted?)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MaintenanceSource (LocalFile | Remote) → maintenance page  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Next handler (the wrapped service)                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use maintenance_gate::{MaintenanceConfig, MaintenanceLayer};
//!
//! # fn main() -> Result<(), maintenance_gate::AppError> {
//! let config = MaintenanceConfig {
//!     enabled: true,
//!     source: "/var/www/maintenance.html".to_string(),
//!     response_status_code: 503,
//!     whitelist_cidrs: vec!["10.0.0.0/8".to_string()],
//!     ..MaintenanceConfig::default()
//! };
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(MaintenanceLayer::new(&config, "public-site")?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, MaintenanceConfig};
pub use error::{AppError, AppResult};
pub use gate::{MaintenanceGate, MaintenanceSource, Verdict};
pub use middleware::{MaintenanceLayer, MaintenanceService};
pub use routes::build_router;
pub use state::AppState;
