// crates/lead-intake-server/src/lib.rs
// ============================================================================
// Module: Lead Intake Server Library
// Description: HTTP surface and process wiring for the lead-intake bridge.
// Purpose: Expose the router, application state, and configured server.
// Dependencies: lead-intake-core, lead-intake-config, axum, tokio
// ============================================================================

//! ## Overview
//! [`routes`] holds the axum router and handlers; [`server`] turns a
//! [`lead_intake_config::LeadIntakeConfig`] into backends, a submission
//! pipeline, and a follow-up worker, then serves until shutdown.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use routes::AppState;
pub use routes::RouteSettings;
pub use routes::SUCCESS_MESSAGE;
pub use routes::router;
pub use server::LeadIntakeServer;
pub use server::ServerError;
