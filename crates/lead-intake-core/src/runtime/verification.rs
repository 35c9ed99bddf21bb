// crates/lead-intake-core/src/runtime/verification.rs
// ============================================================================
// Module: Phone Verification
// Description: One-time-code issue and check with per-phone cooldown.
// Purpose: Rate-limit verification codes and track pending verifications.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A code request stores two TTL entries keyed by the phone fingerprint: a
//! cooldown entry that throttles repeat requests and a pending entry that
//! bounds how long a code may be checked. Checking a code consumes the
//! pending entry only when the provider approves it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::LeadEvent;
use crate::core::LeadEventKind;
use crate::core::PhoneFingerprint;
use crate::core::fingerprint;
use crate::interfaces::Clock;
use crate::interfaces::LeadEventSink;
use crate::interfaces::TtlStore;
use crate::interfaces::TtlStoreError;
use crate::interfaces::VerificationProvider;
use crate::interfaces::VerificationProviderError;

// ============================================================================
// SECTION: Settings / Errors
// ============================================================================

/// Verification timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationSettings {
    /// Minimum time between code requests for one phone.
    pub cooldown: Duration,
    /// Lifetime of a pending verification.
    pub pending_ttl: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(180),
            pending_ttl: Duration::from_secs(600),
        }
    }
}

/// Verification errors.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A code was requested too recently.
    #[error("verification requested too recently; retry in {retry_after_secs}s")]
    Cooldown {
        /// Seconds until a new request is accepted (rounded up).
        retry_after_secs: u64,
    },
    /// No pending verification exists or it expired.
    #[error("verification expired or not requested")]
    Expired,
    /// Provider rejected the code.
    #[error("invalid verification code")]
    InvalidCode,
    /// Provider call failed.
    #[error(transparent)]
    Provider(#[from] VerificationProviderError),
    /// TTL store failed.
    #[error(transparent)]
    Store(#[from] TtlStoreError),
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Phone verification service.
#[derive(Clone)]
pub struct VerificationService {
    /// Code delivery and check provider.
    provider: Arc<dyn VerificationProvider>,
    /// Cooldown and pending entry store.
    store: Arc<dyn TtlStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Event sink.
    events: Arc<dyn LeadEventSink>,
    /// Timing settings.
    settings: VerificationSettings,
}

impl VerificationService {
    /// Creates a verification service.
    #[must_use]
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        store: Arc<dyn TtlStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn LeadEventSink>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            events,
            settings,
        }
    }

    /// Sends a code unless the phone is cooling down.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::Cooldown`] while throttled, or a provider
    /// or store error.
    pub async fn request_code(&self, phone: &str) -> Result<(), VerificationError> {
        let fp = fingerprint(phone);
        let result = self.request(phone, &fp).await;
        let now_ms = self.clock.now_ms();
        let event = match &result {
            Ok(()) => LeadEvent::new(LeadEventKind::VerificationSent, now_ms).with_outcome("sent"),
            Err(VerificationError::Cooldown {
                retry_after_secs,
            }) => LeadEvent::new(LeadEventKind::VerificationThrottled, now_ms)
                .with_outcome("cooldown")
                .with_detail(format!("retry after {retry_after_secs}s")),
            Err(err) => LeadEvent::new(LeadEventKind::VerificationFailed, now_ms)
                .with_outcome("error")
                .with_detail(err.to_string()),
        };
        self.events.record(&event.with_fingerprint(&fp));
        result
    }

    /// Checks a code against the pending verification.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::Expired`] with no pending entry,
    /// [`VerificationError::InvalidCode`] when rejected, or a provider or
    /// store error.
    pub async fn verify_code(&self, phone: &str, code: &str) -> Result<(), VerificationError> {
        let fp = fingerprint(phone);
        let result = self.verify(phone, code, &fp).await;
        let now_ms = self.clock.now_ms();
        let event = match &result {
            Ok(()) => {
                LeadEvent::new(LeadEventKind::VerificationApproved, now_ms).with_outcome("approved")
            }
            Err(VerificationError::Expired) => {
                LeadEvent::new(LeadEventKind::VerificationRejected, now_ms).with_outcome("expired")
            }
            Err(VerificationError::InvalidCode) => {
                LeadEvent::new(LeadEventKind::VerificationRejected, now_ms)
                    .with_outcome("invalid_code")
            }
            Err(err) => LeadEvent::new(LeadEventKind::VerificationFailed, now_ms)
                .with_outcome("error")
                .with_detail(err.to_string()),
        };
        self.events.record(&event.with_fingerprint(&fp));
        result
    }

    /// Cooldown check, send, then store both entries.
    async fn request(&self, phone: &str, fp: &PhoneFingerprint) -> Result<(), VerificationError> {
        let now_ms = self.clock.now_ms();
        if let Some(entry) = self.store.get(&cooldown_key(fp), now_ms)? {
            let remaining_ms =
                u64::try_from(entry.expires_at_ms.saturating_sub(now_ms)).unwrap_or(0);
            return Err(VerificationError::Cooldown {
                retry_after_secs: remaining_ms.div_ceil(1000).max(1),
            });
        }
        self.provider.send_code(phone).await?;
        let now_ms = self.clock.now_ms();
        let cooldown_until = now_ms.saturating_add(millis(self.settings.cooldown));
        let pending_until = now_ms.saturating_add(millis(self.settings.pending_ttl));
        self.store.put(&cooldown_key(fp), cooldown_until, now_ms)?;
        self.store.put(&pending_key(fp), pending_until, now_ms)?;
        Ok(())
    }

    /// Pending check, provider check, then consume the pending entry.
    async fn verify(
        &self,
        phone: &str,
        code: &str,
        fp: &PhoneFingerprint,
    ) -> Result<(), VerificationError> {
        if self.store.get(&pending_key(fp), self.clock.now_ms())?.is_none() {
            return Err(VerificationError::Expired);
        }
        if !self.provider.check_code(phone, code).await? {
            return Err(VerificationError::InvalidCode);
        }
        self.store.remove(&pending_key(fp))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// TTL key for the request cooldown.
fn cooldown_key(fp: &PhoneFingerprint) -> String {
    format!("otp:cooldown:{fp}")
}

/// TTL key for the pending verification.
fn pending_key(fp: &PhoneFingerprint) -> String {
    format!("otp:pending:{fp}")
}

/// Converts a duration to saturating milliseconds.
fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
