//! HTTP retrieval of raw feed bytes.

use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a single fetch, including connection setup and body read.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that abort ingestion of a feed before parsing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the fetch timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Fetch the raw bytes of a feed with a single GET.
///
/// There is no retry: a failed feed is reported and picked up again on the
/// next scheduled run. Only a success status yields a body; the caller never
/// sees partial output from a failed fetch.
///
/// # Errors
///
/// - [`FetchError::Timeout`] when the request exceeds [`FETCH_TIMEOUT`]
/// - [`FetchError::Network`] for connection or TLS errors
/// - [`FetchError::HttpStatus`] for any non-2xx response
/// - [`FetchError::ResponseTooLarge`] when the body exceeds 10MB
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, MAX_FEED_SIZE).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
