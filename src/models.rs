//! Response bodies for the host's own endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process can answer
    pub status: String,
    /// Whether the gate currently considers maintenance active (local check only)
    pub maintenance_active: bool,
    /// Diagnostic name of the gate
    pub gate: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}
