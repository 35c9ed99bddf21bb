// crates/lead-intake-core/src/runtime/mod.rs
// ============================================================================
// Module: Lead Intake Runtime
// Description: Submission pipeline, follow-up worker, verification, backends.
// Purpose: Execute lead intake against injected backends.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules hold the stateful services. Every service receives its
//! backends as `Arc<dyn Trait>` so hosts choose between HTTP, SQLite, and
//! in-memory implementations at wiring time.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod followup;
pub mod memory;
pub mod pipeline;
pub mod sinks;
pub mod verification;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::ManualClock;
pub use clock::SystemClock;
pub use followup::FollowupError;
pub use followup::FollowupSettings;
pub use followup::FollowupTask;
pub use followup::FollowupWorker;
pub use followup::WorkerSettings;
pub use memory::InMemoryContactDirectory;
pub use memory::InMemoryFollowupQueue;
pub use memory::InMemoryLinkShortener;
pub use memory::InMemoryRecordStore;
pub use memory::InMemoryTtlStore;
pub use memory::InMemoryVerificationProvider;
pub use memory::SentMessage;
pub use pipeline::DEFAULT_FOLLOWUP_DELAY;
pub use pipeline::PipelineError;
pub use pipeline::PipelineTables;
pub use pipeline::SubmissionPipeline;
pub use sinks::FileEventSink;
pub use sinks::MemoryEventSink;
pub use sinks::NoopEventSink;
pub use sinks::StderrEventSink;
pub use verification::VerificationError;
pub use verification::VerificationService;
pub use verification::VerificationSettings;
