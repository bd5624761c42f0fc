//! HTTP client helpers for the graph store.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::{BuilderError, Result};

/// User agent string identifying this builder.
const USER_AGENT: &str = concat!("lawgraph-builder/", env!("CARGO_PKG_VERSION"));

/// Longest response body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Create a configured HTTP client.
///
/// Requests are not retried: a failed request surfaces to the caller, which
/// decides whether to continue with the next document or batch.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Pass through a successful response, or turn any other status into
/// [`BuilderError::StoreStatus`] carrying the start of the body.
pub fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    tracing::warn!(status = %status, "Graph store request failed");

    Err(BuilderError::StoreStatus {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            message
        },
    })
}
