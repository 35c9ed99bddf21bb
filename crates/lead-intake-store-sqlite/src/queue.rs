// crates/lead-intake-store-sqlite/src/queue.rs
// ============================================================================
// Module: SQLite Follow-up Queue
// Description: Durable FollowupQueue backed by SQLite WAL.
// Purpose: Persist delayed follow-up jobs and their terminal outcomes.
// Dependencies: lead-intake-core, rusqlite, thiserror
// ============================================================================

//! ## Overview
//! One row per follow-up job, keyed by job id. Pending rows are polled in
//! due order through an index on `(status, due_at_ms)`; completed rows are
//! kept with their outcome for inspection. Rows read back from disk are
//! validated and rejected as corrupt when a status label is unknown.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use lead_intake_core::ContactId;
use lead_intake_core::FollowupJob;
use lead_intake_core::FollowupQueue;
use lead_intake_core::FollowupStatus;
use lead_intake_core::JobId;
use lead_intake_core::PhoneFingerprint;
use lead_intake_core::QueueError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the queue.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by every job query.
const JOB_COLUMNS: &str = "job_id, fingerprint, first_name, last_name, contact_id, \
                           created_at_ms, due_at_ms, status, detail";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` follow-up queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteQueueConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteQueueConfig {
    /// Creates a config for `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` queue errors.
#[derive(Debug, Error)]
pub enum SqliteQueueError {
    /// Filesystem error.
    #[error("sqlite queue io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite queue db error: {0}")]
    Db(String),
    /// Stored row could not be interpreted.
    #[error("sqlite queue corruption: {0}")]
    Corrupt(String),
    /// Schema version mismatch.
    #[error("sqlite queue version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid input or configuration.
    #[error("sqlite queue invalid data: {0}")]
    Invalid(String),
    /// Job id is unknown.
    #[error("sqlite queue job not found: {0}")]
    NotFound(String),
}

impl From<SqliteQueueError> for QueueError {
    fn from(error: SqliteQueueError) -> Self {
        match error {
            SqliteQueueError::Io(message)
            | SqliteQueueError::Db(message)
            | SqliteQueueError::VersionMismatch(message) => Self::Store(message),
            SqliteQueueError::Corrupt(message) | SqliteQueueError::Invalid(message) => {
                Self::Invalid(message)
            }
            SqliteQueueError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps an engine error into [`SqliteQueueError::Db`].
fn db_error(err: rusqlite::Error) -> SqliteQueueError {
    SqliteQueueError::Db(err.to_string())
}

// ============================================================================
// SECTION: Queue
// ============================================================================

/// `SQLite`-backed follow-up queue with WAL support.
#[derive(Clone)]
pub struct SqliteFollowupQueue {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteFollowupQueue {
    /// Opens (or creates) a queue database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteQueueError`] when the database cannot be opened or
    /// initialized, or its schema version is not supported.
    pub fn new(config: &SqliteQueueConfig) -> Result<Self, SqliteQueueError> {
        validate_queue_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Counts jobs currently pending.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteQueueError`] when the query fails.
    pub fn pending_count(&self) -> Result<u64, SqliteQueueError> {
        let guard = self.lock()?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM followup_jobs WHERE status = ?1",
                params![FollowupStatus::Pending.as_str()],
                |row| row.get(0),
            )
            .map_err(db_error)?;
        u64::try_from(count).map_err(|_| SqliteQueueError::Corrupt("negative count".to_string()))
    }

    /// Acquires the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteQueueError> {
        self.connection.lock().map_err(|_| SqliteQueueError::Db("mutex poisoned".to_string()))
    }

    /// Inserts a job unless its id already exists.
    fn insert_job(&self, job: &FollowupJob) -> Result<bool, SqliteQueueError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "INSERT OR IGNORE INTO followup_jobs (job_id, fingerprint, first_name, \
                 last_name, contact_id, created_at_ms, due_at_ms, status, detail, \
                 updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    job.job_id.as_str(),
                    job.fingerprint.as_str(),
                    job.first,
                    job.last,
                    job.contact_id.as_str(),
                    job.created_at_ms,
                    job.due_at_ms,
                    job.status.as_str(),
                    job.detail,
                    unix_millis(),
                ],
            )
            .map_err(db_error)?;
        Ok(changed == 1)
    }

    /// Loads pending jobs due at `now_ms`.
    fn select_due(&self, now_ms: i64, limit: usize) -> Result<Vec<FollowupJob>, SqliteQueueError> {
        let limit = i64::try_from(limit)
            .map_err(|_| SqliteQueueError::Invalid("batch limit too large".to_string()))?;
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM followup_jobs WHERE status = ?1 AND due_at_ms <= ?2 \
                 ORDER BY due_at_ms ASC, job_id ASC LIMIT ?3"
            ))
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![FollowupStatus::Pending.as_str(), now_ms, limit], read_row)
            .map_err(db_error)?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.map_err(db_error)?.into_job()?);
        }
        Ok(jobs)
    }

    /// Moves a pending job to `running` with a conditional update.
    fn claim_job(&self, job_id: &JobId) -> Result<bool, SqliteQueueError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE followup_jobs SET status = ?1, updated_at_ms = ?2 \
                 WHERE job_id = ?3 AND status = ?4",
                params![
                    FollowupStatus::Running.as_str(),
                    unix_millis(),
                    job_id.as_str(),
                    FollowupStatus::Pending.as_str(),
                ],
            )
            .map_err(db_error)?;
        if changed == 1 {
            return Ok(true);
        }
        let known = guard
            .query_row(
                "SELECT 1 FROM followup_jobs WHERE job_id = ?1",
                params![job_id.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_error)?;
        match known {
            Some(()) => Ok(false),
            None => Err(SqliteQueueError::NotFound(job_id.to_string())),
        }
    }

    /// Stamps a terminal status on a job.
    fn update_status(
        &self,
        job_id: &JobId,
        status: FollowupStatus,
        detail: Option<&str>,
    ) -> Result<(), SqliteQueueError> {
        if !status.is_terminal() {
            return Err(SqliteQueueError::Invalid(format!(
                "{} is not a terminal status",
                status.as_str()
            )));
        }
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE followup_jobs SET status = ?1, detail = ?2, updated_at_ms = ?3 \
                 WHERE job_id = ?4",
                params![status.as_str(), detail, unix_millis(), job_id.as_str()],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(SqliteQueueError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    /// Loads a job by id.
    fn select_job(&self, job_id: &JobId) -> Result<Option<FollowupJob>, SqliteQueueError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM followup_jobs WHERE job_id = ?1"),
                params![job_id.as_str()],
                read_row,
            )
            .optional()
            .map_err(db_error)?;
        row.map(JobRow::into_job).transpose()
    }
}

impl FollowupQueue for SqliteFollowupQueue {
    fn enqueue(&self, job: &FollowupJob) -> Result<bool, QueueError> {
        self.insert_job(job).map_err(QueueError::from)
    }

    fn due(&self, now_ms: i64, limit: usize) -> Result<Vec<FollowupJob>, QueueError> {
        self.select_due(now_ms, limit).map_err(QueueError::from)
    }

    fn claim(&self, job_id: &JobId) -> Result<bool, QueueError> {
        self.claim_job(job_id).map_err(QueueError::from)
    }

    fn complete(
        &self,
        job_id: &JobId,
        status: FollowupStatus,
        detail: Option<&str>,
    ) -> Result<(), QueueError> {
        self.update_status(job_id, status, detail).map_err(QueueError::from)
    }

    fn get(&self, job_id: &JobId) -> Result<Option<FollowupJob>, QueueError> {
        self.select_job(job_id).map_err(QueueError::from)
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw job row as stored.
struct JobRow {
    /// Job id.
    job_id: String,
    /// Phone fingerprint.
    fingerprint: String,
    /// First name.
    first: String,
    /// Last name.
    last: String,
    /// Contact id.
    contact_id: String,
    /// Creation time.
    created_at_ms: i64,
    /// Due time.
    due_at_ms: i64,
    /// Status label.
    status: String,
    /// Outcome detail.
    detail: Option<String>,
}

impl JobRow {
    /// Converts the row into a job, rejecting unknown status labels.
    fn into_job(self) -> Result<FollowupJob, SqliteQueueError> {
        let status = FollowupStatus::parse(&self.status).ok_or_else(|| {
            SqliteQueueError::Corrupt(format!(
                "unknown status {} for job {}",
                self.status, self.job_id
            ))
        })?;
        Ok(FollowupJob {
            job_id: JobId::new(self.job_id),
            fingerprint: PhoneFingerprint::new(self.fingerprint),
            first: self.first,
            last: self.last,
            contact_id: ContactId::new(self.contact_id),
            created_at_ms: self.created_at_ms,
            due_at_ms: self.due_at_ms,
            status,
            detail: self.detail,
        })
    }
}

/// Reads [`JOB_COLUMNS`] from a row.
fn read_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        job_id: row.get(0)?,
        fingerprint: row.get(1)?,
        first: row.get(2)?,
        last: row.get(3)?,
        contact_id: row.get(4)?,
        created_at_ms: row.get(5)?,
        due_at_ms: row.get(6)?,
        status: row.get(7)?,
        detail: row.get(8)?,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the queue exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteQueueError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteQueueError::Io("queue path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteQueueError::Io(err.to_string()))
}

/// Validates queue paths for length limits.
fn validate_queue_path(path: &Path) -> Result<(), SqliteQueueError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteQueueError::Invalid("queue path is empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteQueueError::Invalid("queue path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteQueueError::Invalid(
                "queue path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteQueueError::Invalid(
            "queue path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection.
fn open_connection(config: &SqliteQueueConfig) -> Result<Connection, SqliteQueueError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    connection.execute_batch("PRAGMA journal_mode = wal;").map_err(db_error)?;
    connection.execute_batch("PRAGMA synchronous = full;").map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(connection)
}

/// Initializes the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteQueueError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS queue_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM queue_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO queue_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS followup_jobs (
                    job_id TEXT PRIMARY KEY,
                    fingerprint TEXT NOT NULL,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    contact_id TEXT NOT NULL,
                    created_at_ms INTEGER NOT NULL,
                    due_at_ms INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    detail TEXT,
                    updated_at_ms INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_followup_jobs_status_due
                    ON followup_jobs (status, due_at_ms);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteQueueError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Returns the current wall-clock time in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
