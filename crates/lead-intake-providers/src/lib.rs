// crates/lead-intake-providers/src/lib.rs
// ============================================================================
// Module: Lead Intake Providers Library
// Description: HTTP implementations of the lead-intake backend interfaces.
// Purpose: Expose TextMagic, Airtable, Short.io, and Twilio Verify clients.
// Dependencies: lead-intake-core, reqwest
// ============================================================================

//! ## Overview
//! Each provider wraps one `reqwest::Client` configured with connect and
//! request timeouts and implements exactly one core interface. Status codes
//! are mapped to the interface's error type; response bodies are never
//! echoed into errors because they may contain phone numbers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod airtable;
pub mod http;
pub mod shortio;
pub mod textmagic;
pub mod twilio;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use airtable::AirtableConfig;
pub use airtable::AirtableRecordStore;
pub use http::HttpSettings;
pub use http::ProviderError;
pub use shortio::ShortIoConfig;
pub use shortio::ShortIoShortener;
pub use textmagic::TextMagicConfig;
pub use textmagic::TextMagicDirectory;
pub use textmagic::normalize_phone;
pub use twilio::TwilioVerifyConfig;
pub use twilio::TwilioVerifyProvider;
