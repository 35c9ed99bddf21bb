// crates/lead-intake-cli/src/main.rs
// ============================================================================
// Module: Lead Intake CLI Entry Point
// Description: Command dispatcher for the lead-intake bridge.
// Purpose: Run the webhook server and offline configuration helpers.
// Dependencies: clap, lead-intake-config, lead-intake-core, lead-intake-server,
//               thiserror, tokio
// ============================================================================

//! ## Overview
//! `lead-intake serve` loads configuration and runs the webhook server with
//! its follow-up worker until Ctrl-C. `config validate` loads and validates
//! configuration without binding anything. `fingerprint` prints the phone
//! fingerprint used for dedupe lookups and prefilled registration links.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use lead_intake_config::LeadIntakeConfig;
use lead_intake_core::fingerprint;
use lead_intake_server::LeadIntakeServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "lead-intake", version, about = "Lead intake webhook bridge")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server and follow-up worker.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the fingerprint of a phone number.
    Fingerprint(FingerprintCommand),
}

/// Shared `--config` flag.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to `LEAD_INTAKE_CONFIG`, then
    /// lead-intake.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration.
    Validate(ConfigArgs),
}

/// Arguments for `fingerprint`.
#[derive(Args, Debug)]
struct FingerprintCommand {
    /// Phone number exactly as submitted.
    #[arg(value_name = "PHONE")]
    phone: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
        Commands::Fingerprint(command) => command_fingerprint(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = LeadIntakeConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || LeadIntakeServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("Server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("Server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("Server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config validate` command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = LeadIntakeConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    write_stdout_line(&config_summary(&config))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `fingerprint` command.
fn command_fingerprint(command: &FingerprintCommand) -> CliResult<ExitCode> {
    write_stdout_line(fingerprint(&command.phone).as_str())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// One-line summary of a validated configuration.
fn config_summary(config: &LeadIntakeConfig) -> String {
    let backends = match config.backends.mode {
        lead_intake_config::BackendMode::Http => "http",
        lead_intake_config::BackendMode::Memory => "memory",
    };
    let queue = match config.followup.queue.store_type {
        lead_intake_config::QueueStoreType::Memory => "memory",
        lead_intake_config::QueueStoreType::Sqlite => "sqlite",
    };
    let verification = if config.verification.enabled { "on" } else { "off" };
    format!(
        "Config valid (port {}, backends {backends}, queue {queue}, verification {verification})",
        config.server.port
    )
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("Failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
