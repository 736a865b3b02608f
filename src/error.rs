use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

/// Error types raised by the maintenance gate.
///
/// # Recovery
///
/// Only `ConfigError` is fatal, and only at construction time. Every other
/// variant is produced on the request path and recovered locally by the gate:
///
/// - `UpstreamTransport` / `UpstreamTimeout` / `UpstreamStatus` - trigger treated as "not live",
///   remote source treated as "emission failed" (request is forwarded)
/// - `LocalRead` - logged, a possibly empty maintenance body is still emitted
///
/// None of these are ever turned into a client-facing 5xx.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upstream request to {url} failed: {source}")]
    UpstreamTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream {url} sent no response within {timeout:?}")]
    UpstreamTimeout { url: String, timeout: Duration },

    #[error("Upstream {url} responded with {status}")]
    UpstreamStatus { url: String, status: StatusCode },

    #[error("Failed to read maintenance file {}: {source}", path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "config",
            AppError::UpstreamTransport { source, .. } if source.is_timeout() => "timeout",
            AppError::UpstreamTransport { .. } => "transport",
            AppError::UpstreamTimeout { .. } => "timeout",
            AppError::UpstreamStatus { .. } => "status",
            AppError::LocalRead { .. } => "local_read",
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
