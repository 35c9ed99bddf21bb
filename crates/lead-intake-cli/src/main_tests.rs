// crates/lead-intake-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Parsing Tests
// Description: Argument parsing and summary formatting.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::path::Path;

use clap::Parser;
use lead_intake_config::LeadIntakeConfig;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::config_summary;

#[test]
fn serve_accepts_optional_config_path() {
    let cli = Cli::try_parse_from(["lead-intake", "serve", "--config", "site.toml"]).unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    assert_eq!(args.config.as_deref(), Some(Path::new("site.toml")));

    let cli = Cli::try_parse_from(["lead-intake", "serve"]).unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    assert!(args.config.is_none());
}

#[test]
fn config_validate_is_nested() {
    let cli = Cli::try_parse_from(["lead-intake", "config", "validate"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Validate(_),
        }
    ));
}

#[test]
fn fingerprint_requires_a_phone() {
    assert!(Cli::try_parse_from(["lead-intake", "fingerprint"]).is_err());
    let cli = Cli::try_parse_from(["lead-intake", "fingerprint", "(555) 010-0100"]).unwrap();
    let Commands::Fingerprint(command) = cli.command else {
        panic!("expected fingerprint");
    };
    assert_eq!(command.phone, "(555) 010-0100");
}

#[test]
fn summary_names_the_selected_backends() {
    let config = LeadIntakeConfig::from_toml_str(
        "[backends]\nmode = \"memory\"\n\n[followup.queue]\ntype = \"sqlite\"\npath = \"q.db\"\n",
    )
    .unwrap();
    assert_eq!(
        config_summary(&config),
        "Config valid (port 8080, backends memory, queue sqlite, verification off)"
    );
}
