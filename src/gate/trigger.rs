//! Trigger endpoint probe.
//!
//! A trigger endpoint lets operators switch maintenance on and off from
//! outside the process: while it answers `200 OK`, maintenance is live; any
//! other status, or no answer within the timeout, means it is not.

use std::time::Duration;

use axum::http::StatusCode;

use crate::error::{AppError, AppResult};

/// GET `url` once and succeed only on exactly `200 OK`.
///
/// The response body is discarded unread.
pub async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> AppResult<()> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| AppError::UpstreamTransport {
            url: url.to_string(),
            source,
        })?;

    match response.status() {
        StatusCode::OK => Ok(()),
        status => Err(AppError::UpstreamStatus {
            url: url.to_string(),
            status,
        }),
    }
}
