// crates/lead-intake-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Run the lead-intake binary for offline commands.
// Purpose: Ensure config validation and fingerprint output behave end to end.
// Dependencies: lead-intake-cli binary, tempfile
//! Run the lead-intake binary for offline commands.

// ============================================================================

//! ## Overview
//! Runs the CLI binary with a cleared environment so only the given config
//! file is consulted.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn lead_intake_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lead-intake"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(lead_intake_bin())
        .args(args)
        .current_dir(dir)
        .env_clear()
        .output()
        .expect("run lead-intake")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn fingerprint_prints_sha256_hex() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["fingerprint", ""]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn config_validate_accepts_memory_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("lead-intake.toml");
    fs::write(
        &config_path,
        "[server]\nport = 9090\n\n[backends]\nmode = \"memory\"\n\n[verification]\nenabled = \
         true\ndemo_code = \"123456\"\n",
    )
    .unwrap();

    let output =
        run(dir.path(), &["config", "validate", "--config", config_path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config valid (port 9090, backends memory"), "stdout: {stdout}");
    assert!(stdout.contains("verification on"), "stdout: {stdout}");
}

#[test]
fn config_validate_rejects_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("lead-intake.toml");
    fs::write(&config_path, "[server]\nport = 9090\n").unwrap();

    let output =
        run(dir.path(), &["config", "validate", "--config", config_path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "stderr: {stderr}");
    assert!(stderr.contains("TEXTMAGIC"), "stderr: {stderr}");
}

#[test]
fn config_validate_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("lead-intake.toml");
    fs::write(&config_path, "[server\nport = ").unwrap();

    let output =
        run(dir.path(), &["config", "validate", "--config", config_path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}
