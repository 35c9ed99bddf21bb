// crates/lead-intake-core/src/runtime/sinks.rs
// ============================================================================
// Module: Lead Event Sinks
// Description: JSON-line event sinks for stderr, files, memory, and no-op.
// Purpose: Provide the structured logging backends for lead events.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Each sink serializes a [`LeadEvent`] to one JSON line. Write failures are
//! swallowed so logging never aborts lead processing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::LeadEvent;
use crate::interfaces::LeadEventSink;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrEventSink;

impl LeadEventSink for StderrEventSink {
    fn record(&self, event: &LeadEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LeadEventSink for FileEventSink {
    fn record(&self, event: &LeadEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Event sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl LeadEventSink for NoopEventSink {
    fn record(&self, _event: &LeadEvent) {}
}

/// Event sink that keeps events in memory for inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Arc<Mutex<Vec<LeadEvent>>>,
}

impl MemoryEventSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LeadEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl LeadEventSink for MemoryEventSink {
    fn record(&self, event: &LeadEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit unwraps for clarity."
    )]

    use super::FileEventSink;
    use crate::core::LeadEvent;
    use crate::core::LeadEventKind;
    use crate::core::PhoneFingerprint;
    use crate::interfaces::LeadEventSink;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(
            &LeadEvent::new(LeadEventKind::SubmissionSkipped, 5)
                .with_fingerprint(&PhoneFingerprint::new("fp"))
                .with_outcome("already_pending"),
        );
        sink.record(&LeadEvent::new(LeadEventKind::WorkerError, 6).with_detail("boom"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> =
            content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "submission_skipped");
        assert_eq!(lines[0]["fingerprint"], "fp");
        assert_eq!(lines[0]["outcome"], "already_pending");
        assert!(lines[0].get("detail").is_none());
        assert_eq!(lines[1]["detail"], "boom");
    }
}
