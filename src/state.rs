//! Shared state for the demonstration host's handlers.
//!
//! The gate itself lives inside the router as a layer; the state keeps a
//! second handle to it so that health endpoints can report whether
//! maintenance is currently active.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::gate::MaintenanceGate;

/// Diagnostic name for the gate in front of the placeholder application.
pub const DEFAULT_GATE_NAME: &str = "app";

/// Shared application state for Axum handlers.
///
/// Cheap to clone: every field is either `Copy` or reference counted.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Gate shared with the maintenance layer
    pub gate: MaintenanceGate,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the gate from `config.maintenance` and wrap it with the config.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the maintenance settings are invalid.
    pub fn new(config: Config) -> AppResult<Self> {
        let gate = MaintenanceGate::new(&config.maintenance, DEFAULT_GATE_NAME)?;

        Ok(Self {
            gate,
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
