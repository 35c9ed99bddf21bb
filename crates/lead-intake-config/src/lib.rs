// crates/lead-intake-config/src/lib.rs
// ============================================================================
// Module: Lead Intake Config Library
// Description: Public API surface for lead-intake configuration.
// Purpose: Expose the configuration model, loader, and validation errors.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Configuration is layered: an optional TOML file, then `.env`, then the
//! process environment, then validation. See [`LeadIntakeConfig::load`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BackendMode;
pub use config::BackendsConfig;
pub use config::ConfigError;
pub use config::ContactsConfig;
pub use config::FollowupConfig;
pub use config::HttpClientConfig;
pub use config::LeadIntakeConfig;
pub use config::LogSink;
pub use config::LoggingConfig;
pub use config::QueueConfig;
pub use config::QueueStoreType;
pub use config::RecordsConfig;
pub use config::ResponseMode;
pub use config::ServerConfig;
pub use config::ShortenerConfig;
pub use config::VerificationConfig;
