// crates/lead-intake-core/src/interfaces/mod.rs
// ============================================================================
// Module: Lead Intake Interfaces
// Description: Backend-agnostic interfaces for contacts, records, and queues.
// Purpose: Define the contract surfaces used by the lead-intake runtime.
// Dependencies: crate::core, async-trait
// ============================================================================

//! ## Overview
//! Every remote system the bridge talks to is reached through a trait in
//! this module. Remote-facing traits are async; the follow-up queue and TTL
//! store are synchronous because their implementations are local (memory or
//! SQLite) and never block for long.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::FollowupJob;
use crate::core::FollowupStatus;
use crate::core::JobId;
use crate::core::LeadEvent;
use crate::core::PartialRecord;
use crate::core::identifiers::ContactId;
use crate::core::identifiers::PhoneFingerprint;

// ============================================================================
// SECTION: Contact Directory
// ============================================================================

/// Contact directory errors.
#[derive(Debug, Error)]
pub enum ContactError {
    /// Transport failure reaching the directory.
    #[error("contact directory request failed: {0}")]
    Request(String),
    /// Directory answered with an unexpected status or payload.
    #[error("contact directory response error: {0}")]
    Response(String),
    /// Contact reported as existing but could not be found.
    #[error("contact not found: {0}")]
    NotFound(String),
}

/// SMS contact directory (resolve contacts and send messages).
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Returns the contact for a phone, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when lookup or creation fails.
    async fn resolve_or_create(
        &self,
        phone: &str,
        first: &str,
        last: &str,
    ) -> Result<ContactId, ContactError>;

    /// Sends a text message to a contact.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when the message is not accepted.
    async fn send(&self, contact_id: &ContactId, text: &str) -> Result<(), ContactError>;
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store errors.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// Transport failure reaching the store.
    #[error("record store request failed: {0}")]
    Request(String),
    /// Store answered with an unexpected status or payload.
    #[error("record store response error: {0}")]
    Response(String),
}

/// Tabular record store keyed by phone fingerprint.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns true when a record with the fingerprint exists in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] when the lookup fails.
    async fn exists(
        &self,
        table: &str,
        fingerprint: &PhoneFingerprint,
    ) -> Result<bool, RecordStoreError>;

    /// Creates a partial record in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] when the write is rejected.
    async fn create(&self, table: &str, record: &PartialRecord) -> Result<(), RecordStoreError>;
}

// ============================================================================
// SECTION: Link Shortener
// ============================================================================

/// Link shortener errors.
#[derive(Debug, Error)]
pub enum ShortenerError {
    /// Transport failure reaching the shortener.
    #[error("link shortener request failed: {0}")]
    Request(String),
    /// Shortener answered with an unexpected status or payload.
    #[error("link shortener response error: {0}")]
    Response(String),
}

/// URL shortening service.
#[async_trait]
pub trait LinkShortener: Send + Sync {
    /// Returns a short URL for `long_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ShortenerError`] when shortening fails.
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenerError>;
}

// ============================================================================
// SECTION: Follow-up Queue
// ============================================================================

/// Follow-up queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Backing store failure.
    #[error("follow-up queue store error: {0}")]
    Store(String),
    /// Stored data could not be interpreted.
    #[error("follow-up queue invalid data: {0}")]
    Invalid(String),
    /// Job identifier is unknown.
    #[error("follow-up job not found: {0}")]
    NotFound(String),
}

/// Queue of delayed follow-up jobs.
pub trait FollowupQueue: Send + Sync {
    /// Enqueues a job; returns false when a job with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the job cannot be stored.
    fn enqueue(&self, job: &FollowupJob) -> Result<bool, QueueError>;

    /// Returns up to `limit` pending jobs due at `now_ms`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the queue cannot be read.
    fn due(&self, now_ms: i64, limit: usize) -> Result<Vec<FollowupJob>, QueueError>;

    /// Moves a pending job to `running`; returns false when it is not pending.
    ///
    /// A claimed job is never returned by [`FollowupQueue::due`] again, even
    /// if recording its terminal status later fails.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the job is unknown or cannot be updated.
    fn claim(&self, job_id: &JobId) -> Result<bool, QueueError>;

    /// Records the terminal status of a job.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the job is unknown, the status is not
    /// terminal, or the job cannot be updated.
    fn complete(
        &self,
        job_id: &JobId,
        status: FollowupStatus,
        detail: Option<&str>,
    ) -> Result<(), QueueError>;

    /// Loads a job by id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the queue cannot be read.
    fn get(&self, job_id: &JobId) -> Result<Option<FollowupJob>, QueueError>;
}

// ============================================================================
// SECTION: TTL Store
// ============================================================================

/// TTL store errors.
#[derive(Debug, Error)]
pub enum TtlStoreError {
    /// Backing store failure.
    #[error("ttl store error: {0}")]
    Store(String),
}

/// Live key held in a [`TtlStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlEntry {
    /// Expiry in unix milliseconds.
    pub expires_at_ms: i64,
}

/// Key store whose entries expire.
pub trait TtlStore: Send + Sync {
    /// Returns the live entry for `key` at `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`TtlStoreError`] when the store cannot be read.
    fn get(&self, key: &str, now_ms: i64) -> Result<Option<TtlEntry>, TtlStoreError>;

    /// Keeps `key` alive until `expires_at_ms`; entries already expired at
    /// `now_ms` may be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TtlStoreError`] when the store cannot be written.
    fn put(&self, key: &str, expires_at_ms: i64, now_ms: i64) -> Result<(), TtlStoreError>;

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`TtlStoreError`] when the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), TtlStoreError>;
}

// ============================================================================
// SECTION: Verification Provider
// ============================================================================

/// Verification provider errors.
#[derive(Debug, Error)]
pub enum VerificationProviderError {
    /// Transport failure reaching the provider.
    #[error("verification provider request failed: {0}")]
    Request(String),
    /// Provider answered with an unexpected status or payload.
    #[error("verification provider response error: {0}")]
    Response(String),
}

/// One-time-code verification provider.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Sends a verification code to `phone`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationProviderError`] when the code is not sent.
    async fn send_code(&self, phone: &str) -> Result<(), VerificationProviderError>;

    /// Returns true when `code` is approved for `phone`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationProviderError`] when the check cannot be made.
    async fn check_code(&self, phone: &str, code: &str) -> Result<bool, VerificationProviderError>;
}

// ============================================================================
// SECTION: Clock / Event Sink
// ============================================================================

/// Source of wall-clock time in unix milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current time in unix milliseconds.
    fn now_ms(&self) -> i64;
}

/// Sink for structured lead events.
pub trait LeadEventSink: Send + Sync {
    /// Records an event. Sinks swallow their own write failures.
    fn record(&self, event: &LeadEvent);
}
