// crates/lead-intake-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Follow-up Queue
// Description: Durable FollowupQueue backend using SQLite WAL.
// Purpose: Keep scheduled follow-ups across process restarts.
// Dependencies: lead-intake-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`lead_intake_core::FollowupQueue`].
//! Jobs are keyed by their follow-up id, so a second enqueue for the same
//! phone fingerprint is ignored, and pending jobs survive a restart.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod queue;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use queue::SqliteFollowupQueue;
pub use queue::SqliteQueueConfig;
pub use queue::SqliteQueueError;
