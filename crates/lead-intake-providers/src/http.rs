// crates/lead-intake-providers/src/http.rs
// ============================================================================
// Module: Provider HTTP Helpers
// Description: Shared client construction and bounded response reading.
// Purpose: Keep timeout and size limits uniform across providers.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Helpers shared by every provider: a timeout-configured client builder,
//! base URL trimming, and a response reader that enforces a size limit
//! before JSON decoding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Maximum response body accepted from a provider.
pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Outbound HTTP timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Provider construction errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Client(String),
    /// Provider configuration is unusable.
    #[error("invalid provider config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a client with the configured timeouts.
pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| ProviderError::Client(err.to_string()))
}

/// Removes trailing slashes from a base URL.
pub(crate) fn trim_base_url(mut base_url: String) -> String {
    let trimmed_len = base_url.trim_end_matches('/').len();
    base_url.truncate(trimmed_len);
    base_url
}

/// Body of a completed response.
pub(crate) struct ResponseBody {
    /// HTTP status.
    pub status: StatusCode,
    /// Raw body bytes (bounded by [`MAX_RESPONSE_BYTES`]).
    pub bytes: Vec<u8>,
}

impl ResponseBody {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_slice(&self.bytes).map_err(|err| format!("invalid json body: {err}"))
    }
}

/// Reads a response body, rejecting oversized payloads.
pub(crate) async fn read_body(response: Response) -> Result<ResponseBody, String> {
    read_body_limited(response, MAX_RESPONSE_BYTES).await
}

/// Reads a response body chunk by chunk, stopping once `max_bytes` is exceeded.
async fn read_body_limited(
    mut response: Response,
    max_bytes: usize,
) -> Result<ResponseBody, String> {
    let status = response.status();
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if response.content_length().is_some_and(|len| len > max_bytes_u64) {
        return Err(format!("response exceeds {max_bytes} bytes"));
    }
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| err.to_string())? {
        if bytes.len().saturating_add(chunk.len()) > max_bytes {
            return Err(format!("response exceeds {max_bytes} bytes"));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(ResponseBody {
        status,
        bytes,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::HttpSettings;
    use super::build_client;
    use super::read_body_limited;
    use super::trim_base_url;

    /// Serves one chunked response (no content length) of `chunks` ten-byte chunks.
    async fn chunked_server(chunks: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let mut response = String::from(
                "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
            );
            for _ in 0..chunks {
                response.push_str("a\r\n0123456789\r\n");
            }
            response.push_str("0\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn chunked_body_over_limit_is_rejected() {
        let url = chunked_server(5).await;
        let client = build_client(&HttpSettings::default()).unwrap();
        let response = client.get(url).send().await.unwrap();
        assert!(response.content_length().is_none());

        let err = read_body_limited(response, 25).await.err().unwrap();
        assert_eq!(err, "response exceeds 25 bytes");
    }

    #[tokio::test]
    async fn chunked_body_within_limit_is_read() {
        let url = chunked_server(3).await;
        let client = build_client(&HttpSettings::default()).unwrap();
        let response = client.get(url).send().await.unwrap();

        let body = read_body_limited(response, 30).await.unwrap();
        assert_eq!(body.bytes.len(), 30);
        assert!(body.status.is_success());
    }

    #[test]
    fn base_url_trailing_slashes_are_removed() {
        assert_eq!(trim_base_url("http://example.local//".to_string()), "http://example.local");
        assert_eq!(trim_base_url("http://example.local/v2".to_string()), "http://example.local/v2");
    }
}
