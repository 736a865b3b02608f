//! Configuration for the maintenance gate and its demonstration host.
//!
//! # Configuration Sources
//!
//! The gate itself only consumes a [`MaintenanceConfig`] value; how that value
//! is produced is up to the host. The bundled binary loads it either from a
//! JSON document (`MAINTENANCE_CONFIG_FILE`) or from individual environment
//! variables, with a `.env` file honored in both cases.
//!
//! # Maintenance Settings
//!
//! - `MAINTENANCE_ENABLED`: Master switch (default: false)
//! - `MAINTENANCE_SOURCE`: File path or absolute URL of the maintenance page
//! - `MAINTENANCE_TRIGGER_URL`: Optional endpoint whose 200 means "maintenance is live"
//! - `MAINTENANCE_STATUS_CODE`: Status emitted with the page (default: 200)
//! - `MAINTENANCE_CONTENT_TYPE`: Content type of the page (default: `text/html; charset=utf-8`)
//! - `MAINTENANCE_WHITELIST`: Comma-separated CIDR ranges exempt from interception
//! - `MAINTENANCE_UPSTREAM_TIMEOUT_MS`: Bound on trigger/source requests (default: 10000)
//!
//! # JSON Shape
//!
//! The JSON document accepts both the field names used here and the names used
//! by the reverse-proxy plugin configuration this gate is usually dropped into:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "fileName": "/var/www/maintenance.html",
//!   "triggerUrl": "http://status.internal/maintenance",
//!   "httpResponseCode": 503,
//!   "httpContentType": "text/html; charset=utf-8",
//!   "whiteListIps": ["10.0.0.0/8"]
//! }
//! ```

use std::env;
use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default status code for the maintenance response.
pub const DEFAULT_RESPONSE_STATUS_CODE: u16 = 200;

/// Default content type for the maintenance response.
pub const DEFAULT_RESPONSE_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Default bound on outbound trigger/source requests.
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// Settings consumed by [`MaintenanceGate`](crate::gate::MaintenanceGate).
///
/// Read-only once handed to the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Master switch.
    pub enabled: bool,

    /// Filesystem path or absolute URL of the maintenance page. Required.
    #[serde(alias = "fileName")]
    pub source: String,

    /// External endpoint polled per request; only a 200 keeps maintenance live.
    #[serde(rename = "triggerUrl")]
    pub trigger_url: Option<String>,

    /// Status code emitted with the maintenance page.
    #[serde(rename = "responseStatusCode", alias = "httpResponseCode")]
    pub response_status_code: u16,

    /// Content-Type header emitted with the maintenance page.
    #[serde(rename = "responseContentType", alias = "httpContentType")]
    pub response_content_type: String,

    /// CIDR ranges whose callers are never shown the maintenance page.
    #[serde(rename = "whitelistCIDRs", alias = "whiteListIps")]
    pub whitelist_cidrs: Vec<String>,

    /// Upper bound for each outbound trigger/source request, in milliseconds.
    #[serde(rename = "upstreamTimeoutMs")]
    pub upstream_timeout_ms: u64,
}

impl MaintenanceConfig {
    /// Trigger URL, with an empty string treated as unset.
    pub fn trigger_url(&self) -> Option<&str> {
        self.trigger_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Configured outbound timeout as a `Duration`.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Parse a JSON document in either naming scheme.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the document is not valid JSON or
    /// has fields of the wrong type.
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::ConfigError(format!("Invalid maintenance config JSON: {e}")))
    }

    fn from_env() -> AppResult<Self> {
        if let Ok(path) = env::var("MAINTENANCE_CONFIG_FILE")
            && !path.trim().is_empty()
        {
            let contents = fs::read_to_string(path.trim()).map_err(|e| {
                AppError::ConfigError(format!("Cannot read MAINTENANCE_CONFIG_FILE {path}: {e}"))
            })?;
            return Self::from_json(&contents);
        }

        Ok(Self {
            enabled: parse_env("MAINTENANCE_ENABLED", false)?,
            source: env::var("MAINTENANCE_SOURCE").unwrap_or_default(),
            trigger_url: env::var("MAINTENANCE_TRIGGER_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            response_status_code: parse_env(
                "MAINTENANCE_STATUS_CODE",
                DEFAULT_RESPONSE_STATUS_CODE,
            )?,
            response_content_type: env::var("MAINTENANCE_CONTENT_TYPE")
                .unwrap_or_else(|_| DEFAULT_RESPONSE_CONTENT_TYPE.to_string()),
            whitelist_cidrs: parse_list("MAINTENANCE_WHITELIST"),
            upstream_timeout_ms: parse_env(
                "MAINTENANCE_UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )?,
        })
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source: String::new(),
            trigger_url: None,
            response_status_code: DEFAULT_RESPONSE_STATUS_CODE,
            response_content_type: DEFAULT_RESPONSE_CONTENT_TYPE.to_string(),
            whitelist_cidrs: Vec::new(),
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
        }
    }
}

/// Host process configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,

    /// Gate settings.
    pub maintenance: MaintenanceConfig,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value is malformed
    /// (e.g., non-numeric PORT, unreadable MAINTENANCE_CONFIG_FILE).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 3000)?,
            metrics_port: parse_env("METRICS_PORT", 9090)?,
            maintenance: MaintenanceConfig::from_env()?,
        })
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            metrics_port: 9090,
            maintenance: MaintenanceConfig::default(),
        }
    }
}

/// Parse an environment variable into the specified type with a default value.
fn parse_env<T>(name: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list, dropping empty entries.
fn parse_list(name: &str) -> Vec<String> {
    env::var(name)
        .ok()
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
