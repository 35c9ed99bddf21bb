// crates/lead-intake-server/tests/server.rs
// ============================================================================
// Module: Server Wiring Tests
// Description: Build the server from configuration and serve it end to end.
// ============================================================================

//! Build the server from configuration and serve it end to end.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and fixtures."
)]

use std::time::Duration;

use lead_intake_config::LeadIntakeConfig;
use lead_intake_server::LeadIntakeServer;
use lead_intake_server::ServerError;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn memory_config(dir: &TempDir) -> LeadIntakeConfig {
    let toml = format!(
        r#"
[backends]
mode = "memory"

[followup.queue]
type = "sqlite"
path = "{queue}"

[verification]
enabled = true
demo_code = "123456"

[logging]
sink = "file"
path = "{log}"
"#,
        queue = dir.path().join("queue.db").display(),
        log = dir.path().join("events.jsonl").display(),
    );
    LeadIntakeConfig::from_toml_str(&toml).unwrap()
}

#[tokio::test]
async fn configured_server_serves_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let server = LeadIntakeServer::from_config(memory_config(&dir)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_listener(listener, async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::new();
    let health = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let submitted = client
        .post(format!("{base_url}/webhook/framer-submission"))
        .json(&json!({"first": "Ada", "last": "Lovelace", "phone": "(555) 010-0100"}))
        .send()
        .await
        .unwrap();
    assert_eq!(submitted.status(), StatusCode::OK);

    let sent = client
        .post(format!("{base_url}/send-otp"))
        .json(&json!({"phone": "(555) 010-0100"}))
        .send()
        .await
        .unwrap();
    assert_eq!(sent.status(), StatusCode::OK);

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();

    let log = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
    let events: Vec<Value> = log.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events[0]["event"], "server_started");
    assert!(events.iter().any(|event| event["event"] == "verification_sent"));
    assert!(!log.contains("010-0100"));
}

#[test]
fn http_mode_without_credentials_is_a_config_error() {
    let result = LeadIntakeServer::from_config(LeadIntakeConfig::default());
    assert!(matches!(result, Err(ServerError::Config(_))));
}

#[test]
fn unwritable_event_log_is_an_init_error() {
    let dir = TempDir::new().unwrap();
    let mut config = memory_config(&dir);
    config.logging.path = Some(dir.path().to_path_buf());
    let result = LeadIntakeServer::from_config(config);
    assert!(matches!(result, Err(ServerError::Init(_))));
}
