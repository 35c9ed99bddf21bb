// crates/lead-intake-providers/src/textmagic.rs
// ============================================================================
// Module: TextMagic Contact Directory
// Description: Contact lookup, creation, and SMS delivery over TextMagic v2.
// Purpose: Implement `ContactDirectory` against the TextMagic REST API.
// Dependencies: lead-intake-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Phones are normalized before every call: spaces, dashes, and parentheses
//! are stripped and a leading `1` is added when missing. Resolution searches
//! first, creates on a miss, and re-searches when creation reports that the
//! phone already exists (a concurrent creation won the race).

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use lead_intake_core::ContactDirectory;
use lead_intake_core::ContactError;
use lead_intake_core::ContactId;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::http::HttpSettings;
use crate::http::ProviderError;
use crate::http::build_client;
use crate::http::read_body;
use crate::http::trim_base_url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error text TextMagic returns for a duplicate phone.
const ALREADY_EXISTS_MARKER: &str = "already exists in your contacts";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// `TextMagic` connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMagicConfig {
    /// API base URL, e.g. `https://rest.textmagic.com/api/v2`.
    pub base_url: String,
    /// Account username (basic auth user).
    pub username: String,
    /// API key (basic auth password).
    pub api_key: String,
    /// List new contacts are added to.
    pub list_id: Option<String>,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Total matches.
    #[serde(default)]
    total: u64,
    /// Matching contacts.
    #[serde(default)]
    resources: Vec<ContactResource>,
}

/// Contact entry carrying only its id.
#[derive(Debug, Deserialize)]
struct ContactResource {
    /// Contact id (number or string on the wire).
    id: Value,
}

/// Contact creation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContactRequest<'a> {
    /// Normalized phone.
    phone: &'a str,
    /// First name.
    first_name: &'a str,
    /// Last name.
    last_name: &'a str,
    /// List id.
    #[serde(skip_serializing_if = "Option::is_none")]
    lists: Option<&'a str>,
}

/// Validation error payload returned with 400.
#[derive(Debug, Default, Deserialize)]
struct ValidationErrorBody {
    /// Error details.
    #[serde(default)]
    errors: ValidationErrors,
}

/// Field-level validation errors.
#[derive(Debug, Default, Deserialize)]
struct ValidationErrors {
    /// Messages per field.
    #[serde(default)]
    fields: ValidationFields,
}

/// Phone field messages.
#[derive(Debug, Default, Deserialize)]
struct ValidationFields {
    /// Messages for the phone field.
    #[serde(default)]
    phone: Vec<String>,
}

/// Message send request.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    /// Recipient contact ids.
    contacts: &'a str,
    /// Message body.
    text: &'a str,
}

/// Result of a creation attempt.
enum CreateResult {
    /// Contact created with this id.
    Created(ContactId),
    /// Phone already belongs to a contact.
    AlreadyExists,
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// `TextMagic`-backed contact directory.
pub struct TextMagicDirectory {
    /// API base URL (no trailing slash).
    base_url: String,
    /// Basic auth username.
    username: String,
    /// Basic auth password.
    api_key: String,
    /// Optional list id for new contacts.
    list_id: Option<String>,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl TextMagicDirectory {
    /// Builds a directory client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the HTTP client cannot be built.
    pub fn new(config: TextMagicConfig, http: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: trim_base_url(config.base_url),
            username: config.username,
            api_key: config.api_key,
            list_id: config.list_id,
            client: build_client(http)?,
        })
    }

    /// Returns the first contact whose phone matches.
    async fn search(&self, phone: &str) -> Result<Option<ContactId>, ContactError> {
        let response = self
            .client
            .get(format!("{}/contacts/search", self.base_url))
            .basic_auth(&self.username, Some(&self.api_key))
            .query(&[("query", phone)])
            .send()
            .await
            .map_err(|err| ContactError::Request(err.to_string()))?;
        let body = read_body(response).await.map_err(ContactError::Request)?;
        if body.status != StatusCode::OK {
            return Err(ContactError::Response(format!("search status {}", body.status)));
        }
        let search: SearchResponse = body.json().map_err(ContactError::Response)?;
        if search.total == 0 {
            return Ok(None);
        }
        Ok(search.resources.first().and_then(|resource| id_from_value(&resource.id)))
    }

    /// Creates a contact.
    async fn create(
        &self,
        phone: &str,
        first: &str,
        last: &str,
    ) -> Result<CreateResult, ContactError> {
        let request = CreateContactRequest {
            phone,
            first_name: first,
            last_name: last,
            lists: self.list_id.as_deref(),
        };
        let response = self
            .client
            .post(format!("{}/contacts", self.base_url))
            .basic_auth(&self.username, Some(&self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| ContactError::Request(err.to_string()))?;
        let body = read_body(response).await.map_err(ContactError::Request)?;
        match body.status {
            StatusCode::CREATED => {
                let created: ContactResource = body.json().map_err(ContactError::Response)?;
                id_from_value(&created.id).map(CreateResult::Created).ok_or_else(|| {
                    ContactError::Response("created contact has no usable id".to_string())
                })
            }
            StatusCode::BAD_REQUEST => {
                let details: ValidationErrorBody = body.json().unwrap_or_default();
                if details.errors.fields.phone.iter().any(|msg| msg.contains(ALREADY_EXISTS_MARKER))
                {
                    Ok(CreateResult::AlreadyExists)
                } else {
                    Err(ContactError::Response("create rejected with status 400".to_string()))
                }
            }
            status => Err(ContactError::Response(format!("create status {status}"))),
        }
    }
}

#[async_trait]
impl ContactDirectory for TextMagicDirectory {
    async fn resolve_or_create(
        &self,
        phone: &str,
        first: &str,
        last: &str,
    ) -> Result<ContactId, ContactError> {
        let normalized = normalize_phone(phone);
        if let Some(id) = self.search(&normalized).await? {
            return Ok(id);
        }
        match self.create(&normalized, first, last).await? {
            CreateResult::Created(id) => Ok(id),
            CreateResult::AlreadyExists => self.search(&normalized).await?.ok_or_else(|| {
                ContactError::NotFound(
                    "contact reported as existing but search was empty".to_string(),
                )
            }),
        }
    }

    async fn send(&self, contact_id: &ContactId, text: &str) -> Result<(), ContactError> {
        let request = SendMessageRequest {
            contacts: contact_id.as_str(),
            text,
        };
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .basic_auth(&self.username, Some(&self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| ContactError::Request(err.to_string()))?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(ContactError::Response(format!("send status {status}"))),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Strips separators and ensures a leading country code `1`.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let digits: String =
        phone.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect();
    if digits.starts_with('1') { digits } else { format!("1{digits}") }
}

/// Extracts a contact id from a JSON number or string.
fn id_from_value(value: &Value) -> Option<ContactId> {
    match value {
        Value::Number(number) => Some(ContactId::new(number.to_string())),
        Value::String(text) if !text.is_empty() => Some(ContactId::new(text.clone())),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
