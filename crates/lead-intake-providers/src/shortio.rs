// crates/lead-intake-providers/src/shortio.rs
// ============================================================================
// Module: Short.io Link Shortener
// Description: Link creation over the Short.io REST API.
// Purpose: Implement `LinkShortener` for reminder links.
// Dependencies: lead-intake-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Short.io takes the raw API key in `Authorization` (no scheme prefix).

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use lead_intake_core::LinkShortener;
use lead_intake_core::ShortenerError;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::Serialize;

use crate::http::HttpSettings;
use crate::http::ProviderError;
use crate::http::build_client;
use crate::http::read_body;
use crate::http::trim_base_url;

// ============================================================================
// SECTION: Configuration / Wire Types
// ============================================================================

/// Short.io connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortIoConfig {
    /// API base URL, e.g. `https://api.short.io`.
    pub base_url: String,
    /// Secret API key.
    pub api_key: String,
    /// Short link domain.
    pub domain: String,
}

/// Link creation request.
#[derive(Debug, Serialize)]
struct CreateLinkRequest<'a> {
    /// Destination URL.
    #[serde(rename = "originalURL")]
    original_url: &'a str,
    /// Short domain.
    domain: &'a str,
}

/// Link creation response.
#[derive(Debug, Deserialize)]
struct CreateLinkResponse {
    /// Generated short URL.
    #[serde(rename = "shortURL")]
    short_url: String,
}

// ============================================================================
// SECTION: Shortener
// ============================================================================

/// Short.io-backed link shortener.
pub struct ShortIoShortener {
    /// API base URL (no trailing slash).
    base_url: String,
    /// Secret API key.
    api_key: String,
    /// Short link domain.
    domain: String,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl ShortIoShortener {
    /// Builds a shortener client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the HTTP client cannot be built.
    pub fn new(config: ShortIoConfig, http: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: trim_base_url(config.base_url),
            api_key: config.api_key,
            domain: config.domain,
            client: build_client(http)?,
        })
    }
}

#[async_trait]
impl LinkShortener for ShortIoShortener {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError> {
        let request = CreateLinkRequest {
            original_url: long_url,
            domain: &self.domain,
        };
        let response = self
            .client
            .post(format!("{}/links", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| ShortenerError::Request(err.to_string()))?;
        let body = read_body(response).await.map_err(ShortenerError::Request)?;
        if !matches!(body.status, StatusCode::OK | StatusCode::CREATED) {
            return Err(ShortenerError::Response(format!("shorten status {}", body.status)));
        }
        let created: CreateLinkResponse = body.json().map_err(ShortenerError::Response)?;
        if created.short_url.is_empty() {
            return Err(ShortenerError::Response("empty shortURL".to_string()));
        }
        Ok(created.short_url)
    }
}
