//! Placeholder application behind the maintenance gate.

use axum::http::Uri;
use tracing::debug;

/// Stand-in for the real application: reached only when the gate forwards.
pub async fn application(uri: Uri) -> String {
    debug!(path = %uri.path(), "Request reached application");
    format!("application is serving {}\n", uri.path())
}
