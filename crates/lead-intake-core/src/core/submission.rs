// crates/lead-intake-core/src/core/submission.rs
// ============================================================================
// Module: Submission Model
// Description: Inbound submission payloads, partial records, and outcomes.
// Purpose: Capture the data flowing through the submission pipeline.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SubmissionInput`] arrives from a webhook. When the lead is absent from
//! both the partial and completed tables the pipeline writes exactly one
//! [`PartialRecord`]; otherwise it reports a [`SkipReason`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::followup::FollowupJob;
use crate::core::identifiers::PhoneFingerprint;

// ============================================================================
// SECTION: Submission Input
// ============================================================================

/// Lead submission as received from a landing-page form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionInput {
    /// Lead first name.
    #[serde(default)]
    pub first: String,
    /// Lead last name.
    #[serde(default)]
    pub last: String,
    /// Raw phone string as typed by the lead.
    #[serde(default)]
    pub phone: String,
}

impl SubmissionInput {
    /// Creates a submission input.
    #[must_use]
    pub fn new(
        first: impl Into<String>,
        last: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            phone: phone.into(),
        }
    }

    /// Validates that every field is present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] when any field is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first.is_empty() || self.last.is_empty() || self.phone.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}

/// Submission validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required fields were empty or absent.
    #[error("Missing required fields")]
    MissingFields,
}

// ============================================================================
// SECTION: Partial Record
// ============================================================================

/// Record written to the partial table for a lead that has not finished
/// registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    /// Lead first name.
    pub first: String,
    /// Lead last name.
    pub last: String,
    /// Raw phone string.
    pub phone: String,
    /// Phone fingerprint used for dedupe lookups.
    pub hash: PhoneFingerprint,
    /// Numeric contact identifier from the contact directory.
    #[serde(rename = "Contact ID")]
    pub contact_id: i64,
}

impl PartialRecord {
    /// Builds a partial record from a submission.
    #[must_use]
    pub fn from_submission(
        input: &SubmissionInput,
        hash: PhoneFingerprint,
        contact_id: i64,
    ) -> Self {
        Self {
            first: input.first.clone(),
            last: input.last.clone(),
            phone: input.phone.clone(),
            hash,
            contact_id,
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Reason a submission produced no new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A partial record already exists.
    AlreadyPending,
    /// The lead already completed registration.
    AlreadyCompleted,
    /// Both a partial and a completed record exist.
    PendingAndCompleted,
}

impl SkipReason {
    /// Maps table presence flags to a skip reason (`None` when absent from both).
    #[must_use]
    pub const fn from_presence(in_partial: bool, in_completed: bool) -> Option<Self> {
        match (in_partial, in_completed) {
            (false, false) => None,
            (true, false) => Some(Self::AlreadyPending),
            (false, true) => Some(Self::AlreadyCompleted),
            (true, true) => Some(Self::PendingAndCompleted),
        }
    }

    /// Returns the stable label used in events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyPending => "already_pending",
            Self::AlreadyCompleted => "already_completed",
            Self::PendingAndCompleted => "pending_and_completed",
        }
    }
}

/// Result of processing one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A partial record was written and a follow-up job scheduled.
    Recorded {
        /// Scheduled follow-up job.
        job: FollowupJob,
    },
    /// No write was performed.
    Skipped(SkipReason),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
