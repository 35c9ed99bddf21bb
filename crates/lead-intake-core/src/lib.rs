// crates/lead-intake-core/src/lib.rs
// ============================================================================
// Module: Lead Intake Core Library
// Description: Public API surface for the lead-intake core.
// Purpose: Expose domain types, backend interfaces, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Lead Intake core turns landing-page submissions into deduplicated partial
//! records and schedules delayed SMS follow-ups for leads that never finish
//! the downstream registration form. Every remote system sits behind an
//! explicit trait in [`interfaces`] so hosts can wire HTTP backends,
//! durable queues, or in-memory fakes without touching pipeline logic.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::ContactDirectory;
pub use interfaces::ContactError;
pub use interfaces::FollowupQueue;
pub use interfaces::LeadEventSink;
pub use interfaces::LinkShortener;
pub use interfaces::QueueError;
pub use interfaces::RecordStore;
pub use interfaces::RecordStoreError;
pub use interfaces::ShortenerError;
pub use interfaces::TtlEntry;
pub use interfaces::TtlStore;
pub use interfaces::TtlStoreError;
pub use interfaces::VerificationProvider;
pub use interfaces::VerificationProviderError;
pub use runtime::FileEventSink;
pub use runtime::FollowupError;
pub use runtime::FollowupSettings;
pub use runtime::FollowupTask;
pub use runtime::FollowupWorker;
pub use runtime::InMemoryContactDirectory;
pub use runtime::InMemoryFollowupQueue;
pub use runtime::InMemoryLinkShortener;
pub use runtime::InMemoryRecordStore;
pub use runtime::InMemoryTtlStore;
pub use runtime::InMemoryVerificationProvider;
pub use runtime::ManualClock;
pub use runtime::MemoryEventSink;
pub use runtime::NoopEventSink;
pub use runtime::PipelineError;
pub use runtime::PipelineTables;
pub use runtime::StderrEventSink;
pub use runtime::SubmissionPipeline;
pub use runtime::SystemClock;
pub use runtime::VerificationError;
pub use runtime::VerificationService;
pub use runtime::VerificationSettings;
pub use runtime::WorkerSettings;
