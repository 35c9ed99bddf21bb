// crates/lead-intake-providers/src/twilio.rs
// ============================================================================
// Module: Twilio Verify Provider
// Description: SMS verification codes over the Twilio Verify v2 API.
// Purpose: Implement `VerificationProvider` for the OTP endpoints.
// Dependencies: lead-intake-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Twilio Verify uses form-encoded bodies and HTTP basic auth with the
//! account SID and auth token. A check is approved only when the returned
//! status is `approved`; a 404 means Twilio has no pending verification
//! and is reported as not approved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use lead_intake_core::VerificationProvider;
use lead_intake_core::VerificationProviderError;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::http::HttpSettings;
use crate::http::ProviderError;
use crate::http::build_client;
use crate::http::read_body;
use crate::http::trim_base_url;

// ============================================================================
// SECTION: Configuration / Wire Types
// ============================================================================

/// Twilio Verify connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioVerifyConfig {
    /// API base URL, e.g. `https://verify.twilio.com/v2`.
    pub base_url: String,
    /// Account SID (basic auth user).
    pub account_sid: String,
    /// Auth token (basic auth password).
    pub auth_token: String,
    /// Verify service SID.
    pub service_sid: String,
}

/// Verification check response.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    /// Verification status.
    status: String,
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Twilio Verify-backed verification provider.
pub struct TwilioVerifyProvider {
    /// Service URL (`<base>/Services/<sid>`).
    service_url: String,
    /// Basic auth user.
    account_sid: String,
    /// Basic auth password.
    auth_token: String,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl TwilioVerifyProvider {
    /// Builds a provider client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the HTTP client cannot be built.
    pub fn new(config: TwilioVerifyConfig, http: &HttpSettings) -> Result<Self, ProviderError> {
        let base_url = trim_base_url(config.base_url);
        Ok(Self {
            service_url: format!("{base_url}/Services/{}", config.service_sid),
            account_sid: config.account_sid,
            auth_token: config.auth_token,
            client: build_client(http)?,
        })
    }
}

#[async_trait]
impl VerificationProvider for TwilioVerifyProvider {
    async fn send_code(&self, phone: &str) -> Result<(), VerificationProviderError> {
        let response = self
            .client
            .post(format!("{}/Verifications", self.service_url))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Channel", "sms")])
            .send()
            .await
            .map_err(|err| VerificationProviderError::Request(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(VerificationProviderError::Response(format!("send status {status}")))
        }
    }

    async fn check_code(&self, phone: &str, code: &str) -> Result<bool, VerificationProviderError> {
        let response = self
            .client
            .post(format!("{}/VerificationCheck", self.service_url))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Code", code)])
            .send()
            .await
            .map_err(|err| VerificationProviderError::Request(err.to_string()))?;
        let body = read_body(response).await.map_err(VerificationProviderError::Request)?;
        match body.status {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let check: CheckResponse =
                    body.json().map_err(VerificationProviderError::Response)?;
                Ok(check.status == "approved")
            }
            status => Err(VerificationProviderError::Response(format!("check status {status}"))),
        }
    }
}
