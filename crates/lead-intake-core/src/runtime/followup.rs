// crates/lead-intake-core/src/runtime/followup.rs
// ============================================================================
// Module: Follow-up Runtime
// Description: Follow-up task execution and the queue-draining worker.
// Purpose: Send one reminder per unfinished lead once its delay elapses.
// Dependencies: crate::{core, interfaces}, tokio, url
// ============================================================================

//! ## Overview
//! [`FollowupTask::run`] re-checks the completed table, then shortens the
//! prefilled registration link and texts it to the lead. [`FollowupWorker`]
//! drains due jobs from a [`FollowupQueue`], claiming each before it runs and
//! recording its terminal status afterwards. A job runs at most once: a
//! failed job stays failed, and a job whose status cannot be recorded stays
//! `running`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::sync::watch;
use url::Url;

use crate::core::DEFAULT_MESSAGE_TEMPLATE;
use crate::core::FollowupJob;
use crate::core::FollowupOutcome;
use crate::core::FollowupStatus;
use crate::core::LeadEvent;
use crate::core::LeadEventKind;
use crate::core::registration_url;
use crate::core::render_message;
use crate::interfaces::Clock;
use crate::interfaces::ContactDirectory;
use crate::interfaces::ContactError;
use crate::interfaces::FollowupQueue;
use crate::interfaces::LeadEventSink;
use crate::interfaces::LinkShortener;
use crate::interfaces::QueueError;
use crate::interfaces::RecordStore;
use crate::interfaces::RecordStoreError;
use crate::interfaces::ShortenerError;

// ============================================================================
// SECTION: Follow-up Task
// ============================================================================

/// Reminder content settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowupSettings {
    /// Registration form URL that receives the prefill parameters.
    pub form_url: Url,
    /// Message template with `{first}` and `{link}` placeholders.
    pub message_template: String,
    /// Table whose presence suppresses the reminder.
    pub completed_table: String,
}

impl FollowupSettings {
    /// Creates settings with the default message template.
    #[must_use]
    pub fn new(form_url: Url, completed_table: impl Into<String>) -> Self {
        Self {
            form_url,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            completed_table: completed_table.into(),
        }
    }
}

/// Follow-up execution errors.
#[derive(Debug, Error)]
pub enum FollowupError {
    /// Completed-table lookup failed.
    #[error(transparent)]
    Records(#[from] RecordStoreError),
    /// Link shortening failed.
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    /// Message delivery failed.
    #[error(transparent)]
    Contact(#[from] ContactError),
}

/// Executes a single follow-up job.
#[derive(Clone)]
pub struct FollowupTask {
    /// Contact directory used to send the reminder.
    contacts: Arc<dyn ContactDirectory>,
    /// Record store used for the completed-table check.
    records: Arc<dyn RecordStore>,
    /// Link shortener.
    shortener: Arc<dyn LinkShortener>,
    /// Content settings.
    settings: FollowupSettings,
}

impl FollowupTask {
    /// Creates a follow-up task.
    #[must_use]
    pub fn new(
        contacts: Arc<dyn ContactDirectory>,
        records: Arc<dyn RecordStore>,
        shortener: Arc<dyn LinkShortener>,
        settings: FollowupSettings,
    ) -> Self {
        Self {
            contacts,
            records,
            shortener,
            settings,
        }
    }

    /// Runs the job: suppress when completed, otherwise shorten and send.
    ///
    /// # Errors
    ///
    /// Returns [`FollowupError`] on the first failing remote call.
    pub async fn run(&self, job: &FollowupJob) -> Result<FollowupOutcome, FollowupError> {
        if self.records.exists(&self.settings.completed_table, &job.fingerprint).await? {
            return Ok(FollowupOutcome::Suppressed);
        }
        let long_url =
            registration_url(&self.settings.form_url, &job.first, &job.last, &job.fingerprint);
        let short_link = self.shortener.shorten(long_url.as_str()).await?;
        let text = render_message(&self.settings.message_template, &job.first, &short_link);
        self.contacts.send(&job.contact_id, &text).await?;
        Ok(FollowupOutcome::Notified {
            short_link,
        })
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Worker polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Idle time between queue polls.
    pub poll_interval: Duration,
    /// Maximum jobs taken per poll.
    pub batch_size: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 32,
        }
    }
}

/// Drains due follow-up jobs from a queue.
pub struct FollowupWorker {
    /// Job queue.
    queue: Arc<dyn FollowupQueue>,
    /// Task executor.
    task: FollowupTask,
    /// Time source used to decide which jobs are due.
    clock: Arc<dyn Clock>,
    /// Event sink.
    events: Arc<dyn LeadEventSink>,
    /// Polling settings.
    settings: WorkerSettings,
    /// Wake-up signal raised by the pipeline on enqueue.
    wake: Arc<Notify>,
}

impl FollowupWorker {
    /// Creates a worker.
    #[must_use]
    pub fn new(
        queue: Arc<dyn FollowupQueue>,
        task: FollowupTask,
        clock: Arc<dyn Clock>,
        events: Arc<dyn LeadEventSink>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            task,
            clock,
            events,
            settings,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Returns the handle that wakes the worker before its next poll.
    #[must_use]
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Runs every job due now, one at a time, and returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the queue cannot be read or updated.
    pub async fn run_due(&self) -> Result<usize, QueueError> {
        let mut ran = 0;
        loop {
            let batch = self.queue.due(self.clock.now_ms(), self.settings.batch_size)?;
            if batch.is_empty() {
                return Ok(ran);
            }
            for job in &batch {
                if !self.queue.claim(&job.job_id)? {
                    continue;
                }
                ran += 1;
                self.execute(job).await?;
            }
        }
    }

    /// Polls until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            if let Err(err) = self.run_due().await {
                self.events.record(
                    &LeadEvent::new(LeadEventKind::WorkerError, self.clock.now_ms())
                        .with_outcome("queue_error")
                        .with_detail(err.to_string()),
                );
            }
            tokio::select! {
                () = tokio::time::sleep(self.settings.poll_interval) => {}
                () = self.wake.notified() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    /// Runs one claimed job and stores its terminal status.
    async fn execute(&self, job: &FollowupJob) -> Result<(), QueueError> {
        let result = self.task.run(job).await;
        let now_ms = self.clock.now_ms();
        let status = result.as_ref().map_or(FollowupStatus::Failed, FollowupOutcome::status);
        let (detail, event) = match &result {
            Ok(FollowupOutcome::Notified {
                short_link,
            }) => (
                None,
                LeadEvent::new(LeadEventKind::FollowupNotified, now_ms)
                    .with_outcome("notified")
                    .with_detail(short_link.clone()),
            ),
            Ok(FollowupOutcome::Suppressed) => (
                Some("completed before follow-up".to_string()),
                LeadEvent::new(LeadEventKind::FollowupSuppressed, now_ms)
                    .with_outcome("suppressed"),
            ),
            Err(err) => (
                Some(err.to_string()),
                LeadEvent::new(LeadEventKind::FollowupFailed, now_ms)
                    .with_outcome("failed")
                    .with_detail(err.to_string()),
            ),
        };
        self.events.record(&event.with_fingerprint(&job.fingerprint));
        self.queue.complete(&job.job_id, status, detail.as_deref())
    }
}
