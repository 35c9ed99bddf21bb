// crates/lead-intake-core/tests/pipeline.rs
// ============================================================================
// Module: Submission Pipeline Tests
// Description: Dedupe decisions, scheduling, and abort paths.
// ============================================================================

//! Dedupe decisions, scheduling, and abort paths.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and fixtures."
)]

mod common;

use std::sync::Arc;

use common::COMPLETED;
use common::FailingContactDirectory;
use common::Harness;
use common::PARTIAL;
use common::ReadOnlyRecordStore;
use common::START_MS;
use common::TextIdContactDirectory;
use lead_intake_core::ContactId;
use lead_intake_core::FollowupJob;
use lead_intake_core::FollowupQueue;
use lead_intake_core::FollowupStatus;
use lead_intake_core::JobId;
use lead_intake_core::LeadEventKind;
use lead_intake_core::PipelineError;
use lead_intake_core::SkipReason;
use lead_intake_core::SubmissionInput;
use lead_intake_core::SubmissionOutcome;
use lead_intake_core::fingerprint;

fn ada() -> SubmissionInput {
    SubmissionInput::new("Ada", "Lovelace", "+1 (555) 010-0100")
}

#[tokio::test]
async fn fresh_lead_writes_one_record_and_schedules_job() {
    let harness = Harness::new();
    let outcome = harness.pipeline().process(ada()).await.unwrap();

    let SubmissionOutcome::Recorded {
        job,
    } = outcome
    else {
        panic!("expected recorded outcome");
    };
    let fp = fingerprint("+1 (555) 010-0100");
    assert_eq!(job.fingerprint, fp);
    assert_eq!(job.job_id, JobId::for_submission(&fp, START_MS));
    assert_eq!(job.due_at_ms, START_MS + 15 * 60 * 1000);
    assert_eq!(job.status, FollowupStatus::Pending);

    let records = harness.records.records(PARTIAL);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].hash, fp);
    assert_eq!(records[0].phone, "+1 (555) 010-0100");
    assert_eq!(records[0].contact_id, 1000);
    assert_eq!(harness.queue.jobs().len(), 1);
}

#[tokio::test]
async fn duplicate_submission_writes_exactly_one_record() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();
    pipeline.process(ada()).await.unwrap();
    let second = pipeline.process(ada()).await.unwrap();

    assert_eq!(second, SubmissionOutcome::Skipped(SkipReason::AlreadyPending));
    assert_eq!(harness.records.records(PARTIAL).len(), 1);
    assert_eq!(harness.queue.jobs().len(), 1);
    assert_eq!(harness.contacts.resolve_calls(), 2);
}

#[tokio::test]
async fn completed_lead_is_skipped_without_write_or_job() {
    let harness = Harness::new();
    harness.records.mark_present(COMPLETED, &fingerprint("+1 (555) 010-0100"));

    let outcome = harness.pipeline().process(ada()).await.unwrap();

    assert_eq!(outcome, SubmissionOutcome::Skipped(SkipReason::AlreadyCompleted));
    assert_eq!(harness.records.create_count(), 0);
    assert!(harness.queue.jobs().is_empty());
}

#[tokio::test]
async fn lead_in_both_tables_is_skipped() {
    let harness = Harness::new();
    let fp = fingerprint("+1 (555) 010-0100");
    harness.records.mark_present(PARTIAL, &fp);
    harness.records.mark_present(COMPLETED, &fp);

    let outcome = harness.pipeline().process(ada()).await.unwrap();

    assert_eq!(outcome, SubmissionOutcome::Skipped(SkipReason::PendingAndCompleted));
    assert_eq!(harness.records.create_count(), 0);
}

#[tokio::test]
async fn formatting_variants_are_distinct_leads() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();
    pipeline.process(SubmissionInput::new("Ada", "Lovelace", "555-0100")).await.unwrap();
    let second =
        pipeline.process(SubmissionInput::new("Ada", "Lovelace", "5550100")).await.unwrap();

    assert!(matches!(second, SubmissionOutcome::Recorded { .. }));
    assert_eq!(harness.records.records(PARTIAL).len(), 2);
}

#[tokio::test]
async fn contact_failure_aborts_before_lookups() {
    let harness = Harness::new();
    let pipeline =
        harness.pipeline_with(Arc::new(FailingContactDirectory), Arc::new(harness.records.clone()));

    let err = pipeline.process(ada()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Contact(_)));
    assert_eq!(harness.records.exists_calls(), 0);
    assert!(harness.queue.jobs().is_empty());
    let events = harness.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, LeadEventKind::SubmissionFailed);
    assert_eq!(events[0].outcome.as_deref(), Some("contact_error"));
}

#[tokio::test]
async fn non_numeric_contact_id_aborts_without_write() {
    let harness = Harness::new();
    let pipeline =
        harness.pipeline_with(Arc::new(TextIdContactDirectory), Arc::new(harness.records.clone()));

    let err = pipeline.process(ada()).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidContactId(ref id) if id == "abc-123"));
    assert_eq!(harness.records.create_count(), 0);
    assert!(harness.queue.jobs().is_empty());
}

#[tokio::test]
async fn write_failure_aborts_without_scheduling() {
    let harness = Harness::new();
    let pipeline = harness.pipeline_with(
        Arc::new(harness.contacts.clone()),
        Arc::new(ReadOnlyRecordStore(harness.records.clone())),
    );

    let err = pipeline.process(ada()).await.unwrap_err();

    assert!(matches!(err, PipelineError::Records(_)));
    assert!(harness.queue.jobs().is_empty());
}

#[tokio::test]
async fn events_carry_fingerprint_not_phone() {
    let harness = Harness::new();
    harness.pipeline().process(ada()).await.unwrap();

    let events = harness.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, LeadEventKind::SubmissionRecorded);
    assert_eq!(events[0].fingerprint, Some(fingerprint("+1 (555) 010-0100")));
    let line = serde_json::to_string(&events[0]).unwrap();
    assert!(!line.contains("010-0100"));
}

#[tokio::test]
async fn background_submission_completes_on_runtime() {
    let harness = Harness::new();
    harness.pipeline().submit_in_background(ada()).await.unwrap();

    assert_eq!(harness.records.records(PARTIAL).len(), 1);
}

#[tokio::test]
async fn unqueued_job_is_reported_instead_of_recorded() {
    let harness = Harness::new();
    let fp = fingerprint("+1 (555) 010-0100");
    let existing =
        FollowupJob::pending(fp, "Ada", "Lovelace", ContactId::from(1000), START_MS, 900_000);
    harness.queue.enqueue(&existing).unwrap();

    let err = harness.pipeline().process(ada()).await.unwrap_err();

    assert!(matches!(err, PipelineError::DuplicateJob(ref id) if id == existing.job_id.as_str()));
    assert_eq!(harness.queue.jobs().len(), 1);
    let events = harness.events.events();
    assert_eq!(events[0].outcome.as_deref(), Some("duplicate_job"));
}
