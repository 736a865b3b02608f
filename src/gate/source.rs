//! Where the maintenance page comes from and how it is written out.
//!
//! The configured source string is resolved once, when the gate is built, into
//! either a local file or a remote URL. A string counts as remote only if it
//! parses as an absolute URL with a non-empty host; everything else
//! (relative paths, `C:/...`, `file:///...`) is treated as a filesystem path.
//!
//! # Failure Policy
//!
//! | Source | Failure | Result |
//! |--------|---------|--------|
//! | Remote | transport error / no response in time | `Err`, caller forwards the request |
//! | Remote | non-200 status | `Err`, caller forwards the request |
//! | File | read error | logged, page emitted with an empty body |
//!
//! The remote timeout covers the request up to the response head. Once the
//! status and headers have been accepted the body is streamed to the caller
//! without a deadline, so a slow page is delivered whole rather than cut off
//! after the maintenance status has already been sent.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::metrics;

/// Status and content type stamped on every maintenance response.
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub status: StatusCode,
    pub content_type: HeaderValue,
}

impl PageSettings {
    fn respond(&self, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, self.content_type.clone());
        response
    }
}

/// Resolved maintenance page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceSource {
    /// Page read from disk on every intercepted request.
    LocalFile { path: PathBuf },
    /// Page fetched with a GET on every intercepted request.
    Remote { url: Url },
}

impl MaintenanceSource {
    pub fn resolve(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => {
                MaintenanceSource::Remote { url }
            }
            _ => MaintenanceSource::LocalFile {
                path: PathBuf::from(source),
            },
        }
    }

    /// `"file"` or `"url"`, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MaintenanceSource::LocalFile { .. } => "file",
            MaintenanceSource::Remote { .. } => "url",
        }
    }

    /// Whether the source names a path that can currently be stat'ed.
    ///
    /// Remote sources never exist locally.
    pub async fn exists_locally(&self) -> bool {
        match self {
            MaintenanceSource::LocalFile { path } => tokio::fs::metadata(path).await.is_ok(),
            MaintenanceSource::Remote { .. } => false,
        }
    }

    /// Produce the maintenance response for one intercepted request.
    ///
    /// # Errors
    ///
    /// Only the remote variant fails: `UpstreamTimeout` when no response head
    /// arrives within `timeout`, `UpstreamTransport` when the GET fails outright,
    /// `UpstreamStatus` for anything but 200.
    pub async fn resolve_and_stream(
        &self,
        gate: &str,
        client: &reqwest::Client,
        timeout: Duration,
        page: &PageSettings,
    ) -> AppResult<Response<Body>> {
        let started = Instant::now();
        let result = match self {
            MaintenanceSource::LocalFile { path } => Ok(read_file(gate, path, page).await),
            MaintenanceSource::Remote { url } => fetch_remote(client, url, timeout, page).await,
        };
        metrics::record_source_duration(gate, self.kind(), started.elapsed().as_secs_f64());
        result
    }
}

async fn read_file(gate: &str, path: &Path, page: &PageSettings) -> Response<Body> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) => {
            let err = AppError::LocalRead {
                path: path.to_path_buf(),
                source,
            };
            warn!(
                gate = %gate,
                source_kind = "file",
                error = %err,
                "Maintenance file unreadable, serving empty maintenance body"
            );
            metrics::record_upstream_error(gate, err.kind());
            Vec::new()
        }
    };

    debug!(gate = %gate, path = %path.display(), bytes = bytes.len(), "Serving maintenance file");
    page.respond(Body::from(bytes))
}

async fn fetch_remote(
    client: &reqwest::Client,
    url: &Url,
    timeout: Duration,
    page: &PageSettings,
) -> AppResult<Response<Body>> {
    let response = tokio::time::timeout(timeout, client.get(url.clone()).send())
        .await
        .map_err(|_| AppError::UpstreamTimeout {
            url: url.to_string(),
            timeout,
        })?
        .map_err(|source| AppError::UpstreamTransport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::UpstreamStatus {
            url: url.to_string(),
            status,
        });
    }

    Ok(page.respond(Body::from_stream(response.bytes_stream())))
}
