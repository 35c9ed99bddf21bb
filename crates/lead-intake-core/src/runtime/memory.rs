// crates/lead-intake-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Backends
// Description: Mutex-backed implementations of every lead-intake interface.
// Purpose: Run the bridge locally and in tests without remote services.
// Dependencies: crate::core, crate::interfaces, async-trait
// ============================================================================

//! ## Overview
//! These backends keep state in `BTreeMap`s behind `Arc<Mutex<_>>`, so
//! clones share state and tests can inspect exactly which calls were made.
//! State is lost on restart; they are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;

use crate::core::ContactId;
use crate::core::FollowupJob;
use crate::core::FollowupStatus;
use crate::core::JobId;
use crate::core::PartialRecord;
use crate::core::PhoneFingerprint;
use crate::interfaces::ContactDirectory;
use crate::interfaces::ContactError;
use crate::interfaces::FollowupQueue;
use crate::interfaces::LinkShortener;
use crate::interfaces::QueueError;
use crate::interfaces::RecordStore;
use crate::interfaces::RecordStoreError;
use crate::interfaces::ShortenerError;
use crate::interfaces::TtlEntry;
use crate::interfaces::TtlStore;
use crate::interfaces::TtlStoreError;
use crate::interfaces::VerificationProvider;
use crate::interfaces::VerificationProviderError;

/// Locks a mutex, mapping poisoning to a message for the caller's error type.
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{what} mutex poisoned"))
}

// ============================================================================
// SECTION: Contact Directory
// ============================================================================

/// Message captured by [`InMemoryContactDirectory::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient contact.
    pub contact_id: ContactId,
    /// Message text.
    pub text: String,
}

/// Directory state shared across clones.
#[derive(Debug, Default)]
struct DirectoryState {
    /// Contacts keyed by raw phone.
    contacts: BTreeMap<String, ContactId>,
    /// Next identifier to assign.
    next_id: i64,
    /// Number of resolve calls.
    resolve_calls: usize,
    /// Sent messages in order.
    sent: Vec<SentMessage>,
}

/// In-memory contact directory that assigns sequential numeric ids.
#[derive(Debug, Clone)]
pub struct InMemoryContactDirectory {
    /// Shared directory state.
    state: Arc<Mutex<DirectoryState>>,
}

impl Default for InMemoryContactDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryContactDirectory {
    /// Creates an empty directory; the first contact receives id 1000.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DirectoryState {
                next_id: 1000,
                ..DirectoryState::default()
            })),
        }
    }

    /// Returns the number of `resolve_or_create` calls.
    #[must_use]
    pub fn resolve_calls(&self) -> usize {
        self.state.lock().map(|state| state.resolve_calls).unwrap_or_default()
    }

    /// Returns all sent messages.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().map(|state| state.sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn resolve_or_create(
        &self,
        phone: &str,
        _first: &str,
        _last: &str,
    ) -> Result<ContactId, ContactError> {
        let mut state = lock(&self.state, "contact directory").map_err(ContactError::Request)?;
        state.resolve_calls += 1;
        if let Some(existing) = state.contacts.get(phone) {
            return Ok(existing.clone());
        }
        let id = ContactId::from(state.next_id);
        state.next_id += 1;
        state.contacts.insert(phone.to_string(), id.clone());
        Ok(id)
    }

    async fn send(&self, contact_id: &ContactId, text: &str) -> Result<(), ContactError> {
        let mut state = lock(&self.state, "contact directory").map_err(ContactError::Request)?;
        if !state.contacts.values().any(|id| id == contact_id) {
            return Err(ContactError::NotFound(contact_id.to_string()));
        }
        state.sent.push(SentMessage {
            contact_id: contact_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store state shared across clones.
#[derive(Debug, Default)]
struct RecordState {
    /// Fingerprints present per table.
    present: BTreeMap<String, BTreeSet<PhoneFingerprint>>,
    /// Records created per table, in order.
    created: BTreeMap<String, Vec<PartialRecord>>,
    /// Number of `exists` calls.
    exists_calls: usize,
}

/// In-memory record store with per-table fingerprint sets.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    /// Shared store state.
    state: Arc<Mutex<RecordState>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a fingerprint as present in `table` without creating a record.
    pub fn mark_present(&self, table: &str, fingerprint: &PhoneFingerprint) {
        if let Ok(mut state) = self.state.lock() {
            state.present.entry(table.to_string()).or_default().insert(fingerprint.clone());
        }
    }

    /// Returns the records created in `table`.
    #[must_use]
    pub fn records(&self, table: &str) -> Vec<PartialRecord> {
        self.state
            .lock()
            .map(|state| state.created.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Returns the total number of records created across tables.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.created.values().map(Vec::len).sum())
            .unwrap_or_default()
    }

    /// Returns the number of `exists` calls.
    #[must_use]
    pub fn exists_calls(&self) -> usize {
        self.state.lock().map(|state| state.exists_calls).unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn exists(
        &self,
        table: &str,
        fingerprint: &PhoneFingerprint,
    ) -> Result<bool, RecordStoreError> {
        let mut state = lock(&self.state, "record store").map_err(RecordStoreError::Request)?;
        state.exists_calls += 1;
        Ok(state.present.get(table).is_some_and(|set| set.contains(fingerprint)))
    }

    async fn create(&self, table: &str, record: &PartialRecord) -> Result<(), RecordStoreError> {
        let mut state = lock(&self.state, "record store").map_err(RecordStoreError::Request)?;
        state.present.entry(table.to_string()).or_default().insert(record.hash.clone());
        state.created.entry(table.to_string()).or_default().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Link Shortener
// ============================================================================

/// In-memory shortener returning `https://<domain>/<n>` links.
#[derive(Debug, Clone)]
pub struct InMemoryLinkShortener {
    /// Domain used for generated links.
    domain: String,
    /// Long URLs requested, in order.
    requests: Arc<Mutex<Vec<String>>>,
}

impl InMemoryLinkShortener {
    /// Creates a shortener for `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the long URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LinkShortener for InMemoryLinkShortener {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError> {
        let mut requests = lock(&self.requests, "link shortener").map_err(ShortenerError::Request)?;
        requests.push(long_url.to_string());
        Ok(format!("https://{}/{}", self.domain, requests.len()))
    }
}

// ============================================================================
// SECTION: Follow-up Queue
// ============================================================================

/// In-memory follow-up queue keyed by job id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFollowupQueue {
    /// Jobs keyed by job id.
    jobs: Arc<Mutex<BTreeMap<String, FollowupJob>>>,
}

impl InMemoryFollowupQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every job regardless of status.
    #[must_use]
    pub fn jobs(&self) -> Vec<FollowupJob> {
        self.jobs.lock().map(|jobs| jobs.values().cloned().collect()).unwrap_or_default()
    }
}

impl FollowupQueue for InMemoryFollowupQueue {
    fn enqueue(&self, job: &FollowupJob) -> Result<bool, QueueError> {
        let mut jobs = lock(&self.jobs, "follow-up queue").map_err(QueueError::Store)?;
        if jobs.contains_key(job.job_id.as_str()) {
            return Ok(false);
        }
        jobs.insert(job.job_id.as_str().to_string(), job.clone());
        Ok(true)
    }

    fn due(&self, now_ms: i64, limit: usize) -> Result<Vec<FollowupJob>, QueueError> {
        let jobs = lock(&self.jobs, "follow-up queue").map_err(QueueError::Store)?;
        let mut due: Vec<FollowupJob> =
            jobs.values().filter(|job| job.is_due(now_ms)).cloned().collect();
        due.sort_by(|a, b| a.due_at_ms.cmp(&b.due_at_ms).then_with(|| a.job_id.cmp(&b.job_id)));
        due.truncate(limit);
        Ok(due)
    }

    fn claim(&self, job_id: &JobId) -> Result<bool, QueueError> {
        let mut jobs = lock(&self.jobs, "follow-up queue").map_err(QueueError::Store)?;
        let job = jobs
            .get_mut(job_id.as_str())
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;
        if job.status != FollowupStatus::Pending {
            return Ok(false);
        }
        job.status = FollowupStatus::Running;
        Ok(true)
    }

    fn complete(
        &self,
        job_id: &JobId,
        status: FollowupStatus,
        detail: Option<&str>,
    ) -> Result<(), QueueError> {
        if !status.is_terminal() {
            let label = status.as_str();
            return Err(QueueError::Invalid(format!("{label} is not a terminal status")));
        }
        let mut jobs = lock(&self.jobs, "follow-up queue").map_err(QueueError::Store)?;
        let job = jobs
            .get_mut(job_id.as_str())
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;
        job.status = status;
        job.detail = detail.map(str::to_string);
        Ok(())
    }

    fn get(&self, job_id: &JobId) -> Result<Option<FollowupJob>, QueueError> {
        let jobs = lock(&self.jobs, "follow-up queue").map_err(QueueError::Store)?;
        Ok(jobs.get(job_id.as_str()).cloned())
    }
}

// ============================================================================
// SECTION: TTL Store
// ============================================================================

/// In-memory TTL store; expired entries are dropped on read and on write.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTtlStore {
    /// Entries keyed by name.
    entries: Arc<Mutex<BTreeMap<String, TtlEntry>>>,
}

impl InMemoryTtlStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many entries are held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TtlStore for InMemoryTtlStore {
    fn get(&self, key: &str, now_ms: i64) -> Result<Option<TtlEntry>, TtlStoreError> {
        let mut entries = lock(&self.entries, "ttl store").map_err(TtlStoreError::Store)?;
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now_ms => Ok(Some(*entry)),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, expires_at_ms: i64, now_ms: i64) -> Result<(), TtlStoreError> {
        let mut entries = lock(&self.entries, "ttl store").map_err(TtlStoreError::Store)?;
        entries.retain(|_, entry| entry.expires_at_ms > now_ms);
        entries.insert(
            key.to_string(),
            TtlEntry {
                expires_at_ms,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TtlStoreError> {
        let mut entries = lock(&self.entries, "ttl store").map_err(TtlStoreError::Store)?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// SECTION: Verification Provider
// ============================================================================

/// In-memory verification provider that approves one fixed code.
#[derive(Debug, Clone)]
pub struct InMemoryVerificationProvider {
    /// Code accepted by `check_code`.
    code: String,
    /// Phones a code was sent to, in order.
    sent_to: Arc<Mutex<Vec<String>>>,
}

impl InMemoryVerificationProvider {
    /// Creates a provider approving `code`.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            sent_to: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the phones a code was sent to.
    #[must_use]
    pub fn sent_to(&self) -> Vec<String> {
        self.sent_to.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VerificationProvider for InMemoryVerificationProvider {
    async fn send_code(&self, phone: &str) -> Result<(), VerificationProviderError> {
        let mut sent = lock(&self.sent_to, "verification provider")
            .map_err(VerificationProviderError::Request)?;
        sent.push(phone.to_string());
        Ok(())
    }

    async fn check_code(
        &self,
        _phone: &str,
        code: &str,
    ) -> Result<bool, VerificationProviderError> {
        Ok(code == self.code)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
