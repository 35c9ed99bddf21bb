// crates/lead-intake-core/src/core/followup.rs
// ============================================================================
// Module: Follow-up Model
// Description: Follow-up jobs, terminal statuses, and reminder rendering.
// Purpose: Describe delayed reminder work independently of how it is queued.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! A [`FollowupJob`] is created once per fresh submission. When it comes due
//! the runtime claims it (`pending` to `running`), re-checks the completed
//! table, and either sends a reminder built by [`registration_url`] and
//! [`render_message`] or suppresses it. A claimed job is never due again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::core::identifiers::ContactId;
use crate::core::identifiers::JobId;
use crate::core::identifiers::PhoneFingerprint;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default reminder text; `{first}` and `{link}` are substituted.
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Hello {first}! Finish signing up for DemocracyOS here: {link}";

// ============================================================================
// SECTION: Follow-up Job
// ============================================================================

/// Lifecycle status of a follow-up job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupStatus {
    /// Waiting for its due time.
    Pending,
    /// Claimed by a worker; never picked up again.
    Running,
    /// Reminder SMS sent.
    Notified,
    /// Lead completed registration before the job ran.
    Suppressed,
    /// A remote call failed; the job is not retried.
    Failed,
}

impl FollowupStatus {
    /// Returns the stable storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Notified => "notified",
            Self::Suppressed => "suppressed",
            Self::Failed => "failed",
        }
    }

    /// Parses a storage label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "notified" => Some(Self::Notified),
            "suppressed" => Some(Self::Suppressed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true for statuses that end the job.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

/// Delayed reminder for one lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupJob {
    /// Idempotency key derived from the fingerprint and creation time.
    pub job_id: JobId,
    /// Phone fingerprint of the lead.
    pub fingerprint: PhoneFingerprint,
    /// Lead first name.
    pub first: String,
    /// Lead last name.
    pub last: String,
    /// Contact to message.
    pub contact_id: ContactId,
    /// Creation time in unix milliseconds.
    pub created_at_ms: i64,
    /// Due time in unix milliseconds.
    pub due_at_ms: i64,
    /// Current status.
    pub status: FollowupStatus,
    /// Failure or suppression detail recorded on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FollowupJob {
    /// Creates a pending job due `delay_ms` after `now_ms`.
    #[must_use]
    pub fn pending(
        fingerprint: PhoneFingerprint,
        first: impl Into<String>,
        last: impl Into<String>,
        contact_id: ContactId,
        now_ms: i64,
        delay_ms: i64,
    ) -> Self {
        Self {
            job_id: JobId::for_submission(&fingerprint, now_ms),
            fingerprint,
            first: first.into(),
            last: last.into(),
            contact_id,
            created_at_ms: now_ms,
            due_at_ms: now_ms.saturating_add(delay_ms),
            status: FollowupStatus::Pending,
            detail: None,
        }
    }

    /// Returns true when the job is pending and due at `now_ms`.
    #[must_use]
    pub const fn is_due(&self, now_ms: i64) -> bool {
        matches!(self.status, FollowupStatus::Pending) && self.due_at_ms <= now_ms
    }
}

/// Result of running a follow-up job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowupOutcome {
    /// Reminder sent with the given short link.
    Notified {
        /// Short link included in the message.
        short_link: String,
    },
    /// Lead had already completed registration.
    Suppressed,
}

impl FollowupOutcome {
    /// Returns the terminal job status for this outcome.
    #[must_use]
    pub const fn status(&self) -> FollowupStatus {
        match self {
            Self::Notified {
                ..
            } => FollowupStatus::Notified,
            Self::Suppressed => FollowupStatus::Suppressed,
        }
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Builds the prefilled registration URL (`first`, `last`, `id` in that order).
#[must_use]
pub fn registration_url(
    form_url: &Url,
    first: &str,
    last: &str,
    fingerprint: &PhoneFingerprint,
) -> Url {
    let mut url = form_url.clone();
    url.query_pairs_mut()
        .append_pair("first", first)
        .append_pair("last", last)
        .append_pair("id", fingerprint.as_str());
    url
}

/// Renders a reminder message from a template.
///
/// Placeholders inside the substituted values are left untouched.
#[must_use]
pub fn render_message(template: &str, first: &str, link: &str) -> String {
    template
        .split("{link}")
        .map(|piece| piece.replace("{first}", first))
        .collect::<Vec<_>>()
        .join(link)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
