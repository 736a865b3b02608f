//! Request deadline propagation into outbound maintenance calls.
//!
//! The gate may issue up to two outbound requests while handling one inbound
//! request (trigger check, remote maintenance page). Both are bounded by the
//! gate's configured upstream timeout. A caller can tighten that bound for its
//! own request with the `X-Request-Timeout` header:
//!
//! ```text
//! X-Request-Timeout: 2000  # give up on trigger/source after 2 seconds
//! ```
//!
//! [`extract_request_timeout`] validates the header and stores a
//! [`RequestTimeout`] in request extensions; the gate then uses
//! [`RequestTimeoutExt::effective_timeout`] to pick the smaller of the two.
//! A caller can only shorten the configured bound, never extend it.
//!
//! Values outside `MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS`, zero, or
//! non-numeric values are ignored.

use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Minimum accepted deadline (100ms).
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

/// Maximum accepted deadline (5 minutes).
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

/// Header name for client-specified request timeout.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout";

/// Client-supplied deadline, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout {
    pub duration: Duration,
}

impl RequestTimeout {
    /// Returns `None` if the value is outside the accepted range.
    pub fn from_millis(ms: u64) -> Option<Self> {
        (MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS)
            .contains(&ms)
            .then(|| Self {
                duration: Duration::from_millis(ms),
            })
    }
}

/// Middleware that validates `X-Request-Timeout` and stores it for the gate.
pub async fn extract_request_timeout(mut request: Request, next: Next) -> Response {
    if let Some(value) = request.headers().get(REQUEST_TIMEOUT_HEADER)
        && let Ok(value_str) = value.to_str()
    {
        match value_str.trim().parse::<u64>().ok().and_then(RequestTimeout::from_millis) {
            Some(timeout) => {
                debug!(timeout = ?timeout.duration, "Client supplied request deadline");
                request.extensions_mut().insert(timeout);
            }
            None => {
                debug!(
                    value = value_str,
                    min = MIN_REQUEST_TIMEOUT_MS,
                    max = MAX_REQUEST_TIMEOUT_MS,
                    "Ignoring invalid X-Request-Timeout"
                );
            }
        }
    }

    next.run(request).await
}

/// Extension trait for reading the deadline back out of a request.
pub trait RequestTimeoutExt {
    /// The client deadline capped at `bound`, or `bound` if none was given.
    fn effective_timeout(&self, bound: Duration) -> Duration;
}

impl<B> RequestTimeoutExt for axum::http::Request<B> {
    fn effective_timeout(&self, bound: Duration) -> Duration {
        self.extensions()
            .get::<RequestTimeout>()
            .map_or(bound, |t| t.duration.min(bound))
    }
}
