// crates/lead-intake-providers/src/airtable.rs
// ============================================================================
// Module: Airtable Record Store
// Description: Fingerprint lookups and partial-record creation on Airtable.
// Purpose: Implement `RecordStore` against the Airtable REST API.
// Dependencies: lead-intake-core, reqwest, serde, url
// ============================================================================

//! ## Overview
//! Lookups use `filterByFormula={hash}="<fingerprint>"`; a record exists
//! when the response lists at least one record. Table names are
//! percent-encoded as path segments, so names with spaces work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use lead_intake_core::PartialRecord;
use lead_intake_core::PhoneFingerprint;
use lead_intake_core::RecordStore;
use lead_intake_core::RecordStoreError;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::http::HttpSettings;
use crate::http::ProviderError;
use crate::http::build_client;
use crate::http::read_body;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Airtable connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    /// API base URL, e.g. `https://api.airtable.com/v0`.
    pub base_url: String,
    /// Personal access token.
    pub api_key: String,
    /// Base identifier.
    pub base_id: String,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// List response; only the record count matters.
#[derive(Debug, Deserialize)]
struct ListResponse {
    /// Matching records.
    #[serde(default)]
    records: Vec<Value>,
}

/// Create request wrapper.
#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    /// Records to create.
    records: [CreateEntry<'a>; 1],
}

/// Single record entry.
#[derive(Debug, Serialize)]
struct CreateEntry<'a> {
    /// Record fields.
    fields: &'a PartialRecord,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Airtable-backed record store.
pub struct AirtableRecordStore {
    /// API base URL.
    base_url: Url,
    /// Bearer token.
    api_key: String,
    /// Base identifier.
    base_id: String,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl AirtableRecordStore {
    /// Builds a record store client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: AirtableConfig, http: &HttpSettings) -> Result<Self, ProviderError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| ProviderError::Invalid(format!("airtable base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Invalid("airtable base url cannot be a base".to_string()));
        }
        Ok(Self {
            base_url,
            api_key: config.api_key,
            base_id: config.base_id,
            client: build_client(http)?,
        })
    }

    /// Returns the URL of `table` within the configured base.
    fn table_url(&self, table: &str) -> Result<Url, RecordStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RecordStoreError::Request("airtable base url cannot be a base".to_string())
            })?
            .pop_if_empty()
            .push(&self.base_id)
            .push(table);
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for AirtableRecordStore {
    async fn exists(
        &self,
        table: &str,
        fingerprint: &PhoneFingerprint,
    ) -> Result<bool, RecordStoreError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("filterByFormula", &format!("{{hash}}=\"{fingerprint}\""));
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| RecordStoreError::Request(err.to_string()))?;
        let body = read_body(response).await.map_err(RecordStoreError::Request)?;
        if body.status != StatusCode::OK {
            return Err(RecordStoreError::Response(format!("lookup status {}", body.status)));
        }
        let list: ListResponse = body.json().map_err(RecordStoreError::Response)?;
        Ok(!list.records.is_empty())
    }

    async fn create(&self, table: &str, record: &PartialRecord) -> Result<(), RecordStoreError> {
        let request = CreateRequest {
            records: [CreateEntry {
                fields: record,
            }],
        };
        let response = self
            .client
            .post(self.table_url(table)?)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| RecordStoreError::Request(err.to_string()))?;
        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(RecordStoreError::Response(format!("create status {status}"))),
        }
    }
}
