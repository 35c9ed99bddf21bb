// crates/lead-intake-core/src/core/mod.rs
// ============================================================================
// Module: Lead Intake Core Types
// Description: Domain data model for submissions, records, and follow-ups.
// Purpose: Group identifier, fingerprint, record, and event types.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Core types are pure data plus a small amount of deterministic logic
//! (fingerprinting, URL and message rendering). They never perform I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod fingerprint;
pub mod followup;
pub mod identifiers;
pub mod submission;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::LeadEvent;
pub use events::LeadEventKind;
pub use fingerprint::fingerprint;
pub use followup::FollowupJob;
pub use followup::FollowupOutcome;
pub use followup::FollowupStatus;
pub use followup::registration_url;
pub use followup::render_message;
pub use followup::DEFAULT_MESSAGE_TEMPLATE;
pub use identifiers::ContactId;
pub use identifiers::JobId;
pub use identifiers::PhoneFingerprint;
pub use submission::PartialRecord;
pub use submission::SkipReason;
pub use submission::SubmissionInput;
pub use submission::SubmissionOutcome;
pub use submission::ValidationError;
