// crates/lead-intake-core/src/core/identifiers.rs
// ============================================================================
// Module: Lead Intake Identifiers
// Description: Opaque identifiers for fingerprints, contacts, and jobs.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings on the wire. [`ContactId`] is assigned by
//! the contact directory and only interpreted as an integer when a partial
//! record is written. [`JobId`] combines the phone fingerprint with the
//! scheduling time, so every fresh submission gets its own follow-up job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Lowercase hex SHA-256 digest of a raw phone string.
///
/// # Invariants
/// - Produced by [`crate::fingerprint`]; 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneFingerprint(String);

impl PhoneFingerprint {
    /// Wraps an existing fingerprint string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PhoneFingerprint {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PhoneFingerprint {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Contact identifier assigned by the contact directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Creates a new contact identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier as an integer (`None` when not numeric).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContactId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for ContactId {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

/// Follow-up job identifier (`followup:<fingerprint>:<created_at_ms>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Prefix shared by every follow-up job identifier.
    pub const PREFIX: &'static str = "followup:";

    /// Creates a job identifier from a raw string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the job identifier for a lead scheduled at `created_at_ms`.
    #[must_use]
    pub fn for_submission(fingerprint: &PhoneFingerprint, created_at_ms: i64) -> Self {
        Self(format!("{}{}:{created_at_ms}", Self::PREFIX, fingerprint.as_str()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
