// crates/lead-intake-providers/tests/textmagic.rs
// ============================================================================
// Module: TextMagic Directory Tests
// Description: Search, create, duplicate recovery, and send against a stub.
// ============================================================================

//! Search, create, duplicate recovery, and send against a stub.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and fixtures."
)]

mod common;

use axum::http::StatusCode;
use common::StubServer;
use lead_intake_core::ContactDirectory;
use lead_intake_core::ContactError;
use lead_intake_core::ContactId;
use lead_intake_providers::TextMagicConfig;
use lead_intake_providers::TextMagicDirectory;
use serde_json::json;

fn directory(stub: &StubServer) -> TextMagicDirectory {
    TextMagicDirectory::new(
        TextMagicConfig {
            base_url: format!("{}/api/v2/", stub.base_url),
            username: "tm-user".to_string(),
            api_key: "tm-key".to_string(),
            list_id: Some("4344890".to_string()),
        },
        &common::http_settings(),
    )
    .unwrap()
}

#[tokio::test]
async fn existing_contact_is_found_by_normalized_phone() {
    let stub = StubServer::start(vec![(
        "GET /api/v2/contacts/search",
        StatusCode::OK,
        json!({"total": 1, "resources": [{"id": 777}]}),
    )])
    .await;

    let id = directory(&stub).resolve_or_create("(555) 010-0100", "Ada", "Lovelace").await.unwrap();

    assert_eq!(id, ContactId::new("777"));
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.as_deref(), Some("query=15550100100"));
    assert_eq!(requests[0].authorization, Some(common::basic_auth("tm-user", "tm-key")));
}

#[tokio::test]
async fn missing_contact_is_created_in_list() {
    let stub = StubServer::start(vec![
        ("GET /api/v2/contacts/search", StatusCode::OK, json!({"total": 0, "resources": []})),
        ("POST /api/v2/contacts", StatusCode::CREATED, json!({"id": 4242})),
    ])
    .await;

    let id = directory(&stub).resolve_or_create("555 010 0100", "Ada", "Lovelace").await.unwrap();

    assert_eq!(id.as_i64(), Some(4242));
    let create = &stub.requests()[1];
    assert_eq!(create.method, "POST");
    assert_eq!(
        create.json(),
        json!({
            "phone": "15550100100",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "lists": "4344890"
        })
    );
}

#[tokio::test]
async fn duplicate_create_falls_back_to_search() {
    let stub = StubServer::start(vec![
        ("GET /api/v2/contacts/search", StatusCode::OK, json!({"total": 0, "resources": []})),
        (
            "POST /api/v2/contacts",
            StatusCode::BAD_REQUEST,
            json!({
                "errors": {"fields": {"phone": ["Phone number already exists in your contacts."]}}
            }),
        ),
        (
            "GET /api/v2/contacts/search",
            StatusCode::OK,
            json!({"total": 1, "resources": [{"id": "91"}]}),
        ),
    ])
    .await;

    let id = directory(&stub).resolve_or_create("5550100100", "Ada", "Lovelace").await.unwrap();

    assert_eq!(id, ContactId::new("91"));
    assert_eq!(stub.requests().len(), 3);
}

#[tokio::test]
async fn duplicate_create_with_empty_research_is_not_found() {
    let stub = StubServer::start(vec![
        ("GET /api/v2/contacts/search", StatusCode::OK, json!({"total": 0, "resources": []})),
        (
            "POST /api/v2/contacts",
            StatusCode::BAD_REQUEST,
            json!({"errors": {"fields": {"phone": ["already exists in your contacts"]}}}),
        ),
        ("GET /api/v2/contacts/search", StatusCode::OK, json!({"total": 0, "resources": []})),
    ])
    .await;

    let err =
        directory(&stub).resolve_or_create("5550100100", "Ada", "Lovelace").await.unwrap_err();
    assert!(matches!(err, ContactError::NotFound(_)));
}

#[tokio::test]
async fn other_validation_errors_are_reported() {
    let stub = StubServer::start(vec![
        ("GET /api/v2/contacts/search", StatusCode::OK, json!({"total": 0, "resources": []})),
        (
            "POST /api/v2/contacts",
            StatusCode::BAD_REQUEST,
            json!({"errors": {"fields": {"phone": ["Phone number is invalid"]}}}),
        ),
    ])
    .await;

    let err = directory(&stub).resolve_or_create("12", "Ada", "Lovelace").await.unwrap_err();
    assert!(matches!(err, ContactError::Response(_)));
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn send_posts_contact_and_text() {
    let route = ("POST /api/v2/messages", StatusCode::CREATED, json!({}));
    let stub = StubServer::start(vec![route]).await;

    directory(&stub).send(&ContactId::new("777"), "Hello Ada!").await.unwrap();

    assert_eq!(stub.requests()[0].json(), json!({"contacts": "777", "text": "Hello Ada!"}));
}

#[tokio::test]
async fn send_failure_status_is_an_error() {
    let route = ("POST /api/v2/messages", StatusCode::UNAUTHORIZED, json!({}));
    let stub = StubServer::start(vec![route]).await;

    let err = directory(&stub).send(&ContactId::new("777"), "Hello").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
