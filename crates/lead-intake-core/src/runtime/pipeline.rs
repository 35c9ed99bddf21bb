// crates/lead-intake-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Submission Pipeline
// Description: Dedupe, record, and schedule flow for one lead submission.
// Purpose: Turn a validated submission into at most one partial record and job.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! [`SubmissionPipeline::process`] fingerprints the phone, resolves the
//! contact, checks the partial and completed tables, and only when the lead
//! is absent from both writes a partial record and enqueues a follow-up due
//! after the configured delay. Any remote failure aborts the run; nothing is
//! retried.
//!
//! The check-then-create sequence is not atomic. Two concurrent submissions
//! for the same phone can both observe "absent" and both write a record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::core::FollowupJob;
use crate::core::LeadEvent;
use crate::core::LeadEventKind;
use crate::core::PartialRecord;
use crate::core::PhoneFingerprint;
use crate::core::SkipReason;
use crate::core::SubmissionInput;
use crate::core::SubmissionOutcome;
use crate::core::fingerprint;
use crate::interfaces::Clock;
use crate::interfaces::ContactDirectory;
use crate::interfaces::ContactError;
use crate::interfaces::FollowupQueue;
use crate::interfaces::LeadEventSink;
use crate::interfaces::QueueError;
use crate::interfaces::RecordStore;
use crate::interfaces::RecordStoreError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default delay before a follow-up becomes due.
pub const DEFAULT_FOLLOWUP_DELAY: Duration = Duration::from_secs(15 * 60);

/// Record store table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTables {
    /// Table holding leads that started but did not finish registration.
    pub partial: String,
    /// Table holding leads that finished registration.
    pub completed: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Submission pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Contact resolution failed.
    #[error(transparent)]
    Contact(#[from] ContactError),
    /// Table lookup or record write failed.
    #[error(transparent)]
    Records(#[from] RecordStoreError),
    /// Contact identifier could not be used as a record field.
    #[error("contact id is not an integer: {0}")]
    InvalidContactId(String),
    /// Follow-up job could not be enqueued.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// A job with the same identifier was already queued.
    #[error("follow-up job already queued: {0}")]
    DuplicateJob(String),
}

impl PipelineError {
    /// Returns the stable label used in events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Contact(_) => "contact_error",
            Self::Records(_) => "record_store_error",
            Self::InvalidContactId(_) => "invalid_contact_id",
            Self::Queue(_) => "queue_error",
            Self::DuplicateJob(_) => "duplicate_job",
        }
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Submission pipeline over injected backends. Clones share backends.
#[derive(Clone)]
pub struct SubmissionPipeline {
    /// Contact directory.
    contacts: Arc<dyn ContactDirectory>,
    /// Record store.
    records: Arc<dyn RecordStore>,
    /// Follow-up queue.
    queue: Arc<dyn FollowupQueue>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Event sink.
    events: Arc<dyn LeadEventSink>,
    /// Table names.
    tables: PipelineTables,
    /// Delay between submission and follow-up.
    delay: Duration,
    /// Worker wake-up handle, signalled after each enqueue.
    wake: Option<Arc<Notify>>,
}

impl SubmissionPipeline {
    /// Creates a pipeline with the default follow-up delay.
    #[must_use]
    pub fn new(
        contacts: Arc<dyn ContactDirectory>,
        records: Arc<dyn RecordStore>,
        queue: Arc<dyn FollowupQueue>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn LeadEventSink>,
        tables: PipelineTables,
    ) -> Self {
        Self {
            contacts,
            records,
            queue,
            clock,
            events,
            tables,
            delay: DEFAULT_FOLLOWUP_DELAY,
            wake: None,
        }
    }

    /// Overrides the follow-up delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Signals `wake` after every enqueued job.
    #[must_use]
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Processes one submission to completion.
    ///
    /// The input is assumed valid; the HTTP boundary rejects empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when a remote call fails or the contact id
    /// is not numeric. No partial state is rolled back.
    pub async fn process(
        &self,
        input: SubmissionInput,
    ) -> Result<SubmissionOutcome, PipelineError> {
        let fp = fingerprint(&input.phone);
        let result = self.run(&input, &fp).await;
        let event = match &result {
            Ok(SubmissionOutcome::Recorded {
                job,
            }) => LeadEvent::new(LeadEventKind::SubmissionRecorded, self.clock.now_ms())
                .with_outcome("recorded")
                .with_detail(format!("follow-up due at {}", job.due_at_ms)),
            Ok(SubmissionOutcome::Skipped(reason)) => {
                LeadEvent::new(LeadEventKind::SubmissionSkipped, self.clock.now_ms())
                    .with_outcome(reason.as_str())
            }
            Err(err) => LeadEvent::new(LeadEventKind::SubmissionFailed, self.clock.now_ms())
                .with_outcome(err.label())
                .with_detail(err.to_string()),
        };
        self.events.record(&event.with_fingerprint(&fp));
        result
    }

    /// Spawns [`Self::process`] on the current tokio runtime.
    ///
    /// Failures are reported through the event sink only.
    pub fn submit_in_background(&self, input: SubmissionInput) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let _ = pipeline.process(input).await;
        })
    }

    /// Runs the dedupe and scheduling steps.
    async fn run(
        &self,
        input: &SubmissionInput,
        fp: &PhoneFingerprint,
    ) -> Result<SubmissionOutcome, PipelineError> {
        let contact_id =
            self.contacts.resolve_or_create(&input.phone, &input.first, &input.last).await?;

        let in_partial = self.records.exists(&self.tables.partial, fp).await?;
        let in_completed = self.records.exists(&self.tables.completed, fp).await?;
        if let Some(reason) = SkipReason::from_presence(in_partial, in_completed) {
            return Ok(SubmissionOutcome::Skipped(reason));
        }

        let numeric_id = contact_id
            .as_i64()
            .ok_or_else(|| PipelineError::InvalidContactId(contact_id.to_string()))?;
        let record = PartialRecord::from_submission(input, fp.clone(), numeric_id);
        self.records.create(&self.tables.partial, &record).await?;

        let delay_ms = i64::try_from(self.delay.as_millis()).unwrap_or(i64::MAX);
        let job = FollowupJob::pending(
            fp.clone(),
            input.first.clone(),
            input.last.clone(),
            contact_id,
            self.clock.now_ms(),
            delay_ms,
        );
        if !self.queue.enqueue(&job)? {
            return Err(PipelineError::DuplicateJob(job.job_id.to_string()));
        }
        if let Some(wake) = &self.wake {
            wake.notify_one();
        }
        Ok(SubmissionOutcome::Recorded {
            job,
        })
    }
}
