// crates/lead-intake-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared harness and failing backends for core integration tests.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lead_intake_core::ContactDirectory;
use lead_intake_core::ContactError;
use lead_intake_core::ContactId;
use lead_intake_core::FollowupJob;
use lead_intake_core::FollowupQueue;
use lead_intake_core::FollowupSettings;
use lead_intake_core::FollowupStatus;
use lead_intake_core::FollowupTask;
use lead_intake_core::FollowupWorker;
use lead_intake_core::InMemoryContactDirectory;
use lead_intake_core::InMemoryFollowupQueue;
use lead_intake_core::InMemoryLinkShortener;
use lead_intake_core::InMemoryRecordStore;
use lead_intake_core::JobId;
use lead_intake_core::LinkShortener;
use lead_intake_core::ManualClock;
use lead_intake_core::MemoryEventSink;
use lead_intake_core::PartialRecord;
use lead_intake_core::PhoneFingerprint;
use lead_intake_core::PipelineTables;
use lead_intake_core::QueueError;
use lead_intake_core::RecordStore;
use lead_intake_core::RecordStoreError;
use lead_intake_core::ShortenerError;
use lead_intake_core::SubmissionPipeline;
use lead_intake_core::WorkerSettings;
use url::Url;

pub const PARTIAL: &str = "Partial";
pub const COMPLETED: &str = "R2E";
pub const START_MS: i64 = 1_700_000_000_000;
pub const FORM_URL: &str = "https://forms.example.test/register";
pub const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

/// In-memory backends wired together with a manual clock.
#[derive(Clone)]
pub struct Harness {
    pub contacts: InMemoryContactDirectory,
    pub records: InMemoryRecordStore,
    pub queue: InMemoryFollowupQueue,
    pub shortener: InMemoryLinkShortener,
    pub clock: ManualClock,
    pub events: MemoryEventSink,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            contacts: InMemoryContactDirectory::new(),
            records: InMemoryRecordStore::new(),
            queue: InMemoryFollowupQueue::new(),
            shortener: InMemoryLinkShortener::new("s.test"),
            clock: ManualClock::new(START_MS),
            events: MemoryEventSink::new(),
        }
    }

    pub fn tables() -> PipelineTables {
        PipelineTables {
            partial: PARTIAL.to_string(),
            completed: COMPLETED.to_string(),
        }
    }

    pub fn pipeline(&self) -> SubmissionPipeline {
        self.pipeline_with(Arc::new(self.contacts.clone()), Arc::new(self.records.clone()))
    }

    pub fn pipeline_with(
        &self,
        contacts: Arc<dyn ContactDirectory>,
        records: Arc<dyn RecordStore>,
    ) -> SubmissionPipeline {
        SubmissionPipeline::new(
            contacts,
            records,
            Arc::new(self.queue.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.events.clone()),
            Self::tables(),
        )
        .with_delay(FIFTEEN_MINUTES)
    }

    pub fn task(&self) -> FollowupTask {
        self.task_with(Arc::new(self.shortener.clone()))
    }

    pub fn task_with(&self, shortener: Arc<dyn LinkShortener>) -> FollowupTask {
        FollowupTask::new(
            Arc::new(self.contacts.clone()),
            Arc::new(self.records.clone()),
            shortener,
            FollowupSettings::new(Url::parse(FORM_URL).unwrap(), COMPLETED),
        )
    }

    pub fn worker(&self) -> FollowupWorker {
        self.worker_with(self.task())
    }

    pub fn worker_with(&self, task: FollowupTask) -> FollowupWorker {
        self.worker_on(Arc::new(self.queue.clone()), task)
    }

    pub fn worker_on(&self, queue: Arc<dyn FollowupQueue>, task: FollowupTask) -> FollowupWorker {
        FollowupWorker::new(
            queue,
            task,
            Arc::new(self.clock.clone()),
            Arc::new(self.events.clone()),
            WorkerSettings {
                poll_interval: Duration::from_millis(10),
                batch_size: 2,
            },
        )
    }
}

/// Directory whose lookups always fail.
pub struct FailingContactDirectory;

#[async_trait]
impl ContactDirectory for FailingContactDirectory {
    async fn resolve_or_create(
        &self,
        _phone: &str,
        _first: &str,
        _last: &str,
    ) -> Result<ContactId, ContactError> {
        Err(ContactError::Response("status 500".to_string()))
    }

    async fn send(&self, _contact_id: &ContactId, _text: &str) -> Result<(), ContactError> {
        Err(ContactError::Response("status 500".to_string()))
    }
}

/// Directory that assigns non-numeric contact ids.
pub struct TextIdContactDirectory;

#[async_trait]
impl ContactDirectory for TextIdContactDirectory {
    async fn resolve_or_create(
        &self,
        _phone: &str,
        _first: &str,
        _last: &str,
    ) -> Result<ContactId, ContactError> {
        Ok(ContactId::new("abc-123"))
    }

    async fn send(&self, _contact_id: &ContactId, _text: &str) -> Result<(), ContactError> {
        Ok(())
    }
}

/// Record store that answers lookups but rejects writes.
pub struct ReadOnlyRecordStore(pub InMemoryRecordStore);

#[async_trait]
impl RecordStore for ReadOnlyRecordStore {
    async fn exists(
        &self,
        table: &str,
        fingerprint: &PhoneFingerprint,
    ) -> Result<bool, RecordStoreError> {
        self.0.exists(table, fingerprint).await
    }

    async fn create(&self, _table: &str, _record: &PartialRecord) -> Result<(), RecordStoreError> {
        Err(RecordStoreError::Response("status 422".to_string()))
    }
}

/// Queue whose status updates always fail after a job is claimed.
pub struct LockedQueue(pub InMemoryFollowupQueue);

impl FollowupQueue for LockedQueue {
    fn enqueue(&self, job: &FollowupJob) -> Result<bool, QueueError> {
        self.0.enqueue(job)
    }

    fn due(&self, now_ms: i64, limit: usize) -> Result<Vec<FollowupJob>, QueueError> {
        self.0.due(now_ms, limit)
    }

    fn claim(&self, job_id: &JobId) -> Result<bool, QueueError> {
        self.0.claim(job_id)
    }

    fn complete(
        &self,
        _job_id: &JobId,
        _status: FollowupStatus,
        _detail: Option<&str>,
    ) -> Result<(), QueueError> {
        Err(QueueError::Store("database is locked".to_string()))
    }

    fn get(&self, job_id: &JobId) -> Result<Option<FollowupJob>, QueueError> {
        self.0.get(job_id)
    }
}

/// Shortener that always fails.
pub struct FailingShortener;

#[async_trait]
impl LinkShortener for FailingShortener {
    async fn shorten(&self, _long_url: &str) -> Result<String, ShortenerError> {
        Err(ShortenerError::Request("connection refused".to_string()))
    }
}
