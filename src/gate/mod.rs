//! Maintenance gate: decides per request whether to serve the maintenance page.
//!
//! # Decision Order
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────────┐  no
//! │ maintenance active?  │ ─────► forward
//! └──────────┬───────────┘
//!            │ yes
//!            ▼
//! ┌──────────────────────┐  no
//! │ trigger answers 200? │ ─────► forward        (skipped without trigger URL)
//! └──────────┬───────────┘
//!            │ yes
//!            ▼
//! ┌──────────────────────┐  yes
//! │ client whitelisted?  │ ─────► forward        (skipped without whitelist)
//! └──────────┬───────────┘
//!            │ no
//!            ▼
//! ┌──────────────────────┐  error
//! │ emit maintenance page│ ─────► forward        (remote source only)
//! └──────────┬───────────┘
//!            ▼
//!         response
//! ```
//!
//! "Active" is a cheap local check: the gate is enabled and either a trigger
//! URL is configured or the source path exists on disk. Touching or removing
//! the file, or standing up / tearing down the trigger endpoint, toggles
//! maintenance without a restart.
//!
//! # Concurrency
//!
//! All state is immutable after [`MaintenanceGate::new`] and shared through an
//! `Arc`; clones are cheap and safe to use from any number of concurrent
//! requests. Nothing is cached between requests.

mod source;
mod trigger;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::config::MaintenanceConfig;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::whitelist::Whitelist;

pub use source::{MaintenanceSource, PageSettings};

/// Outcome of evaluating one request, before any page is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Gate disabled, or no trigger URL and no source file.
    Inactive,
    /// Trigger endpoint did not answer 200.
    TriggerDeclined,
    /// Caller matched a whitelist range.
    Exempt,
    /// Serve the maintenance page.
    Intercept,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Inactive => "inactive",
            Verdict::TriggerDeclined => "trigger_declined",
            Verdict::Exempt => "exempt",
            Verdict::Intercept => "intercept",
        }
    }
}

struct GateInner {
    name: String,
    enabled: bool,
    source: MaintenanceSource,
    trigger_url: Option<String>,
    page: PageSettings,
    whitelist: Whitelist,
    upstream_timeout: Duration,
    client: reqwest::Client,
}

/// Maintenance-mode decision and response unit.
///
/// # Example
///
/// ```rust,ignore
/// let config = MaintenanceConfig {
///     enabled: true,
///     source: "/var/www/maintenance.html".to_string(),
///     ..MaintenanceConfig::default()
/// };
/// let gate = MaintenanceGate::new(&config, "public-site")?;
///
/// match gate.handle(&client_ip, gate.upstream_timeout()).await {
///     Some(page) => page,
///     None => next.run(req).await,
/// }
/// ```
#[derive(Clone)]
pub struct MaintenanceGate {
    inner: Arc<GateInner>,
}

impl MaintenanceGate {
    /// Validate `config` and build a gate.
    ///
    /// No network or filesystem I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the source is empty, the upstream
    /// timeout is zero, a whitelist entry is not valid CIDR notation, or the
    /// status code / content type cannot be put on an HTTP response.
    pub fn new(config: &MaintenanceConfig, name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();

        if config.source.is_empty() {
            return Err(AppError::ConfigError("source is required".to_string()));
        }

        if config.upstream_timeout_ms == 0 {
            return Err(AppError::ConfigError(
                "upstream timeout must be greater than 0 ms".to_string(),
            ));
        }

        let whitelist = Whitelist::from_cidrs(config.whitelist_cidrs.as_slice())
            .map_err(|(cidr, e)| AppError::ConfigError(format!("invalid CIDR: {cidr}: {e}")))?;

        let status = StatusCode::from_u16(config.response_status_code).map_err(|e| {
            AppError::ConfigError(format!(
                "invalid response status code {}: {e}",
                config.response_status_code
            ))
        })?;

        let content_type = HeaderValue::from_str(&config.response_content_type).map_err(|e| {
            AppError::ConfigError(format!(
                "invalid response content type {:?}: {e}",
                config.response_content_type
            ))
        })?;

        let upstream_timeout = config.upstream_timeout();
        let client = reqwest::Client::builder()
            .connect_timeout(upstream_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        let source = MaintenanceSource::resolve(&config.source);

        info!(
            gate = %name,
            enabled = config.enabled,
            source_kind = source.kind(),
            source = %config.source,
            trigger_url = config.trigger_url().unwrap_or("-"),
            whitelist_ranges = whitelist.len(),
            status = status.as_u16(),
            upstream_timeout_ms = config.upstream_timeout_ms,
            "Maintenance gate configured"
        );

        Ok(Self {
            inner: Arc::new(GateInner {
                name,
                enabled: config.enabled,
                source,
                trigger_url: config.trigger_url().map(str::to_string),
                page: PageSettings {
                    status,
                    content_type,
                },
                whitelist,
                upstream_timeout,
                client,
            }),
        })
    }

    /// Diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn source(&self) -> &MaintenanceSource {
        &self.inner.source
    }

    /// Configured bound on each outbound trigger/source request.
    pub fn upstream_timeout(&self) -> Duration {
        self.inner.upstream_timeout
    }

    /// Local maintenance check, without consulting the trigger endpoint.
    ///
    /// 1. Disabled: inactive.
    /// 2. Trigger URL configured: active (liveness is checked separately).
    /// 3. Source path exists: active.
    /// 4. Otherwise inactive.
    pub async fn is_maintenance_active(&self) -> bool {
        if !self.inner.enabled {
            return false;
        }

        if self.inner.trigger_url.is_some() {
            return true;
        }

        self.inner.source.exists_locally().await
    }

    /// Whether the trigger endpoint currently reports maintenance as live.
    ///
    /// Any failure is logged and counts as "not live".
    pub async fn check_trigger(&self, url: &str, timeout: Duration) -> bool {
        let live = match trigger::probe(&self.inner.client, url, timeout).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    gate = %self.inner.name,
                    source_kind = "trigger",
                    error_kind = e.kind(),
                    error = %e,
                    "Trigger check failed, treating maintenance as not live"
                );
                metrics::record_upstream_error(&self.inner.name, e.kind());
                false
            }
        };

        metrics::record_trigger_check(&self.inner.name, live);
        live
    }

    /// Whether `client_ip` falls inside any configured whitelist range.
    pub fn is_whitelisted(&self, client_ip: &str) -> bool {
        self.inner.whitelist.is_whitelisted(client_ip)
    }

    /// Run the decision chain for one caller.
    pub async fn evaluate(&self, client_ip: &str, timeout: Duration) -> Verdict {
        if !self.is_maintenance_active().await {
            return Verdict::Inactive;
        }

        if let Some(url) = self.inner.trigger_url.as_deref()
            && !self.check_trigger(url, timeout).await
        {
            return Verdict::TriggerDeclined;
        }

        if self.inner.whitelist.is_enabled() && self.is_whitelisted(client_ip) {
            return Verdict::Exempt;
        }

        Verdict::Intercept
    }

    /// Produce the maintenance page, or `None` if the request should be
    /// forwarded instead.
    pub async fn emit(&self, timeout: Duration) -> Option<Response<Body>> {
        let inner = &self.inner;
        match inner
            .source
            .resolve_and_stream(&inner.name, &inner.client, timeout, &inner.page)
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(
                    gate = %inner.name,
                    source_kind = inner.source.kind(),
                    error_kind = e.kind(),
                    error = %e,
                    "Maintenance page unavailable, forwarding request"
                );
                metrics::record_upstream_error(&inner.name, e.kind());
                None
            }
        }
    }

    /// Full per-request orchestration.
    ///
    /// Returns the maintenance response when the caller must be stopped here,
    /// `None` when the request should go to the next handler untouched.
    pub async fn handle(&self, client_ip: &str, timeout: Duration) -> Option<Response<Body>> {
        let verdict = self.evaluate(client_ip, timeout).await;

        let (response, outcome) = match verdict {
            Verdict::Intercept => match self.emit(timeout).await {
                Some(response) => (Some(response), "served"),
                None => (None, "fallthrough"),
            },
            other => (None, other.as_str()),
        };

        debug!(
            gate = %self.inner.name,
            client_ip = %client_ip,
            verdict = verdict.as_str(),
            outcome,
            "Maintenance gate decision"
        );
        metrics::record_request(&self.inner.name, outcome);

        response
    }
}

impl std::fmt::Debug for MaintenanceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceGate")
            .field("name", &self.inner.name)
            .field("enabled", &self.inner.enabled)
            .field("source", &self.inner.source)
            .field("trigger_url", &self.inner.trigger_url)
            .field("whitelist", &self.inner.whitelist)
            .finish_non_exhaustive()
    }
}
