// crates/lead-intake-config/src/config.rs
// ============================================================================
// Module: Lead Intake Configuration
// Description: Configuration model, layered loading, and validation.
// Purpose: Resolve runtime settings from TOML, .env, and the environment.
// Dependencies: dotenvy, serde, toml, url
// ============================================================================

//! ## Overview
//! [`LeadIntakeConfig::load`] resolves an optional TOML file (explicit path,
//! then `LEAD_INTAKE_CONFIG`, then `lead-intake.toml` in the working
//! directory), loads `.env`, applies environment overrides, and validates.
//! Credentials usually arrive through the environment; the TOML file carries
//! everything else.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config filename in the working directory.
const DEFAULT_CONFIG_NAME: &str = "lead-intake.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "LEAD_INTAKE_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP port.
const DEFAULT_PORT: u16 = 8080;
/// Default webhook body limit in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Upper bound for the webhook body limit.
const MAX_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default outbound connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default outbound request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
/// Upper bound for outbound timeouts in milliseconds.
const MAX_TIMEOUT_MS: u64 = 120_000;
/// Default follow-up delay in seconds.
const DEFAULT_DELAY_SECS: u64 = 900;
/// Default worker poll interval in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Minimum worker poll interval in milliseconds.
const MIN_POLL_INTERVAL_MS: u64 = 10;
/// Maximum worker poll interval in milliseconds.
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Default jobs per poll.
const DEFAULT_BATCH_SIZE: usize = 32;
/// Default registration form URL.
const DEFAULT_FORM_URL: &str = "https://forms.democracyos.com/burlingtonvt-register";
/// Default reminder template.
const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Hello {first}! Finish signing up for DemocracyOS here: {link}";
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default verification cooldown in seconds.
const DEFAULT_COOLDOWN_SECS: u64 = 180;
/// Default pending verification lifetime in seconds.
const DEFAULT_PENDING_TTL_SECS: u64 = 600;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Lead intake configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadIntakeConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Backend selection.
    #[serde(default)]
    pub backends: BackendsConfig,
    /// Outbound HTTP client configuration.
    #[serde(default)]
    pub http: HttpClientConfig,
    /// Contact directory (`TextMagic`) configuration.
    #[serde(default)]
    pub contacts: ContactsConfig,
    /// Record store (Airtable) configuration.
    #[serde(default)]
    pub records: RecordsConfig,
    /// Link shortener (Short.io) configuration.
    #[serde(default)]
    pub shortener: ShortenerConfig,
    /// Follow-up scheduling configuration.
    #[serde(default)]
    pub followup: FollowupConfig,
    /// Phone verification configuration.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LeadIntakeConfig {
    /// Loads configuration using the default resolution rules and the
    /// process environment (after loading `.env` when present).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration reading environment variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::from_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `PORT` is not a port number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {port}")))?;
        }
        override_with(&mut self.contacts.api_key, get("TEXTMAGIC_API_KEY"));
        override_with(&mut self.contacts.username, get("TEXTMAGIC_USERNAME"));
        override_with(&mut self.records.api_key, get("AIRTABLE_API_KEY"));
        override_with(&mut self.records.base_id, get("AIRTABLE_BASE_ID"));
        override_with(&mut self.records.partial_table, get("AIRTABLE_PARTIAL_TABLE"));
        override_with(&mut self.records.completed_table, get("AIRTABLE_R2E_TABLE"));
        override_with(&mut self.shortener.api_key, get("SHORTIO_API_KEY"));
        override_with(&mut self.shortener.domain, get("SHORTIO_DOMAIN"));
        override_with(&mut self.verification.account_sid, get("TWILIO_ACCOUNT_SID"));
        override_with(&mut self.verification.auth_token, get("TWILIO_AUTH_TOKEN"));
        override_with(&mut self.verification.service_sid, get("TWILIO_VERIFY_SERVICE_SID"));
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.http.validate()?;
        if self.backends.mode == BackendMode::Http {
            self.contacts.validate()?;
            self.records.validate()?;
            self.shortener.validate()?;
        } else if self.records.partial_table == self.records.completed_table {
            return Err(ConfigError::Invalid(
                "records.partial_table and records.completed_table must differ".to_string(),
            ));
        }
        self.followup.validate()?;
        self.verification.validate(self.backends.mode)?;
        self.logging.validate()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Webhook success response style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// `{"status":"success","message":...}`.
    #[default]
    Message,
    /// `{"status":"success","redirect_url":...}`.
    Redirect,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// Bind port (`PORT` overrides).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Webhook success response style.
    #[serde(default)]
    pub response_mode: ResponseMode,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: DEFAULT_PORT,
            response_mode: ResponseMode::Message,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_host, self.port).parse().or_else(|_| {
            format!("[{}]:{}", self.bind_host, self.port).parse().map_err(|_| {
                ConfigError::Invalid(format!("server.bind_host is not an ip: {}", self.bind_host))
            })
        })
    }

    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Backends / HTTP
// ============================================================================

/// Which backend family to wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Remote HTTP services (`TextMagic`, Airtable, Short.io, Twilio).
    #[default]
    Http,
    /// In-memory fakes for local demos.
    Memory,
}

/// Backend selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    /// Backend family.
    #[serde(default)]
    pub mode: BackendMode,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl HttpClientConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates timeout ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "http.connect_timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.request_timeout_ms < self.connect_timeout_ms
            || self.request_timeout_ms > MAX_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid(format!(
                "http.request_timeout_ms must be between connect_timeout_ms and {MAX_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Remote Services
// ============================================================================

/// Contact directory configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactsConfig {
    /// API base URL.
    #[serde(default = "default_contacts_base_url")]
    pub base_url: String,
    /// Account username (`TEXTMAGIC_USERNAME`).
    #[serde(default)]
    pub username: String,
    /// API key (`TEXTMAGIC_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Contact list new contacts join.
    #[serde(default)]
    pub list_id: Option<String>,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            base_url: default_contacts_base_url(),
            username: String::new(),
            api_key: String::new(),
            list_id: None,
        }
    }
}

impl ContactsConfig {
    /// Validates credentials and base URL.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("contacts.base_url", &self.base_url)?;
        require("contacts.username (TEXTMAGIC_USERNAME)", &self.username)?;
        require("contacts.api_key (TEXTMAGIC_API_KEY)", &self.api_key)?;
        if let Some(list_id) = &self.list_id {
            require("contacts.list_id", list_id)?;
        }
        Ok(())
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordsConfig {
    /// API base URL.
    #[serde(default = "default_records_base_url")]
    pub base_url: String,
    /// API key (`AIRTABLE_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Base identifier (`AIRTABLE_BASE_ID`).
    #[serde(default)]
    pub base_id: String,
    /// Partial table (`AIRTABLE_PARTIAL_TABLE`).
    #[serde(default = "default_partial_table")]
    pub partial_table: String,
    /// Completed table (`AIRTABLE_R2E_TABLE`).
    #[serde(default = "default_completed_table")]
    pub completed_table: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            base_url: default_records_base_url(),
            api_key: String::new(),
            base_id: String::new(),
            partial_table: default_partial_table(),
            completed_table: default_completed_table(),
        }
    }
}

impl RecordsConfig {
    /// Validates credentials, tables, and base URL.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("records.base_url", &self.base_url)?;
        require("records.api_key (AIRTABLE_API_KEY)", &self.api_key)?;
        require("records.base_id (AIRTABLE_BASE_ID)", &self.base_id)?;
        require("records.partial_table (AIRTABLE_PARTIAL_TABLE)", &self.partial_table)?;
        require("records.completed_table (AIRTABLE_R2E_TABLE)", &self.completed_table)?;
        if self.partial_table == self.completed_table {
            return Err(ConfigError::Invalid(
                "records.partial_table and records.completed_table must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Link shortener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortenerConfig {
    /// API base URL.
    #[serde(default = "default_shortener_base_url")]
    pub base_url: String,
    /// API key (`SHORTIO_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Short link domain (`SHORTIO_DOMAIN`).
    #[serde(default)]
    pub domain: String,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            base_url: default_shortener_base_url(),
            api_key: String::new(),
            domain: String::new(),
        }
    }
}

impl ShortenerConfig {
    /// Validates credentials and base URL.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("shortener.base_url", &self.base_url)?;
        require("shortener.api_key (SHORTIO_API_KEY)", &self.api_key)?;
        require("shortener.domain (SHORTIO_DOMAIN)", &self.domain)
    }
}

// ============================================================================
// SECTION: Follow-up
// ============================================================================

/// Follow-up queue backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStoreType {
    /// In-process queue; pending jobs are lost on restart.
    #[default]
    Memory,
    /// Durable `SQLite` queue.
    Sqlite,
}

/// Follow-up queue configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Backing store.
    #[serde(rename = "type", default)]
    pub store_type: QueueStoreType,
    /// Database path (required for `sqlite`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            store_type: QueueStoreType::Memory,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Follow-up scheduling configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowupConfig {
    /// Delay between submission and reminder in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Worker idle poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum jobs per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Registration form URL.
    #[serde(default = "default_form_url")]
    pub form_url: String,
    /// Reminder template with `{first}` and `{link}`.
    #[serde(default = "default_message_template")]
    pub message_template: String,
    /// Queue backing store.
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Default for FollowupConfig {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            form_url: default_form_url(),
            message_template: default_message_template(),
            queue: QueueConfig::default(),
        }
    }
}

impl FollowupConfig {
    /// Returns the follow-up delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Returns the worker poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the parsed form URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL is not absolute http(s).
    pub fn form_url(&self) -> Result<Url, ConfigError> {
        validate_base_url("followup.form_url", &self.form_url)
    }

    /// Validates scheduling, template, and queue settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_secs == 0 {
            return Err(ConfigError::Invalid("followup.delay_secs must be > 0".to_string()));
        }
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "followup.poll_interval_ms must be between {MIN_POLL_INTERVAL_MS} and \
                 {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("followup.batch_size must be > 0".to_string()));
        }
        self.form_url()?;
        if !self.message_template.contains("{link}") {
            return Err(ConfigError::Invalid(
                "followup.message_template must contain {link}".to_string(),
            ));
        }
        if self.queue.store_type == QueueStoreType::Sqlite {
            let Some(path) = &self.queue.path else {
                return Err(ConfigError::Invalid(
                    "followup.queue.path is required for sqlite".to_string(),
                ));
            };
            if path.as_os_str().is_empty()
                || path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH
            {
                return Err(ConfigError::Invalid("followup.queue.path is invalid".to_string()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Phone verification configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Expose `/send-otp` and `/verify-otp`.
    #[serde(default)]
    pub enabled: bool,
    /// Verify API base URL.
    #[serde(default = "default_verification_base_url")]
    pub base_url: String,
    /// Account SID (`TWILIO_ACCOUNT_SID`).
    #[serde(default)]
    pub account_sid: String,
    /// Auth token (`TWILIO_AUTH_TOKEN`).
    #[serde(default)]
    pub auth_token: String,
    /// Verify service SID (`TWILIO_VERIFY_SERVICE_SID`).
    #[serde(default)]
    pub service_sid: String,
    /// Minimum seconds between code requests per phone.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Pending verification lifetime in seconds.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
    /// Code accepted by the in-memory provider.
    #[serde(default)]
    pub demo_code: Option<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_verification_base_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            service_sid: String::new(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            pending_ttl_secs: DEFAULT_PENDING_TTL_SECS,
            demo_code: None,
        }
    }
}

impl VerificationConfig {
    /// Returns the request cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Returns the pending verification lifetime.
    #[must_use]
    pub const fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    /// Validates verification settings when enabled.
    fn validate(&self, mode: BackendMode) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.cooldown_secs == 0 || self.pending_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "verification.cooldown_secs and pending_ttl_secs must be > 0".to_string(),
            ));
        }
        match mode {
            BackendMode::Http => {
                validate_base_url("verification.base_url", &self.base_url)?;
                require("verification.account_sid (TWILIO_ACCOUNT_SID)", &self.account_sid)?;
                require("verification.auth_token (TWILIO_AUTH_TOKEN)", &self.auth_token)?;
                require(
                    "verification.service_sid (TWILIO_VERIFY_SERVICE_SID)",
                    &self.service_sid,
                )
            }
            BackendMode::Memory => match &self.demo_code {
                Some(code) => require("verification.demo_code", code),
                None => Err(ConfigError::Invalid(
                    "verification.demo_code is required with memory backends".to_string(),
                )),
            },
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Event log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Discard events.
    None,
}

/// Event logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Destination.
    #[serde(default)]
    pub sink: LogSink,
    /// Log file path for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates that the file sink has a path.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sink == LogSink::File
            && self.path.as_ref().is_none_or(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid("logging.path is required for file sink".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; `None` means run on defaults and environment.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Replaces `field` when an override is present.
fn override_with(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Requires a non-empty value.
fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be set")));
    }
    Ok(())
}

/// Parses an absolute http(s) URL.
fn validate_base_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    Ok(url)
}

/// Default bind host.
fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

/// Default bind port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default `TextMagic` base URL.
fn default_contacts_base_url() -> String {
    "https://rest.textmagic.com/api/v2".to_string()
}

/// Default Airtable base URL.
fn default_records_base_url() -> String {
    "https://api.airtable.com/v0".to_string()
}

/// Default partial table name.
fn default_partial_table() -> String {
    "Partial".to_string()
}

/// Default completed table name.
fn default_completed_table() -> String {
    "R2E".to_string()
}

/// Default Short.io base URL.
fn default_shortener_base_url() -> String {
    "https://api.short.io".to_string()
}

/// Default follow-up delay.
const fn default_delay_secs() -> u64 {
    DEFAULT_DELAY_SECS
}

/// Default poll interval.
const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default batch size.
const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Default registration form URL.
fn default_form_url() -> String {
    DEFAULT_FORM_URL.to_string()
}

/// Default reminder template.
fn default_message_template() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default Twilio Verify base URL.
fn default_verification_base_url() -> String {
    "https://verify.twilio.com/v2".to_string()
}

/// Default cooldown.
const fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

/// Default pending lifetime.
const fn default_pending_ttl_secs() -> u64 {
    DEFAULT_PENDING_TTL_SECS
}

// ============================================================================
// SECTION: Tests
// ============================================================================
