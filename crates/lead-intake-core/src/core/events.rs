// crates/lead-intake-core/src/core/events.rs
// ============================================================================
// Module: Lead Events
// Description: Structured log records emitted by the pipeline and workers.
// Purpose: Give every outcome and abort a machine-readable JSON line.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Lead events identify a lead only by phone fingerprint; raw phone numbers
//! never reach the event stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::identifiers::PhoneFingerprint;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Event kinds written to the lead event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventKind {
    /// Server began accepting requests.
    ServerStarted,
    /// Partial record written and follow-up scheduled.
    SubmissionRecorded,
    /// Submission skipped because the lead is already known.
    SubmissionSkipped,
    /// Submission aborted by a remote or data error.
    SubmissionFailed,
    /// Follow-up reminder sent.
    FollowupNotified,
    /// Follow-up suppressed because the lead completed registration.
    FollowupSuppressed,
    /// Follow-up aborted by a remote error.
    FollowupFailed,
    /// Follow-up worker could not read or update the queue.
    WorkerError,
    /// Verification code sent.
    VerificationSent,
    /// Verification request rejected by cooldown.
    VerificationThrottled,
    /// Verification code approved.
    VerificationApproved,
    /// Verification code rejected or expired.
    VerificationRejected,
    /// Verification provider or store failure.
    VerificationFailed,
}

/// Structured lead event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadEvent {
    /// Event kind.
    pub event: LeadEventKind,
    /// Event time in unix milliseconds.
    pub timestamp_ms: i64,
    /// Fingerprint of the lead involved, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<PhoneFingerprint>,
    /// Short outcome label (skip reason, status, error class).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Free-form detail such as an error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LeadEvent {
    /// Creates an event with no lead attached.
    #[must_use]
    pub const fn new(event: LeadEventKind, timestamp_ms: i64) -> Self {
        Self {
            event,
            timestamp_ms,
            fingerprint: None,
            outcome: None,
            detail: None,
        }
    }

    /// Attaches a lead fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: &PhoneFingerprint) -> Self {
        self.fingerprint = Some(fingerprint.clone());
        self
    }

    /// Attaches an outcome label.
    #[must_use]
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Attaches free-form detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
