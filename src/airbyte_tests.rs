// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `airbyte.rs`

use super::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/applications/token"))
        .and(body_partial_json(serde_json::json!({
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-token",
        })))
        .mount(server)
        .await;
}

async fn mock_organization(server: &MockServer, email: Option<&str>) {
    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/get"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organizationId": "00000000-0000-0000-0000-000000000000",
            "organizationName": "Airbyte",
            "email": email,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_org_email() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_organization(&server, Some("admin@example.com")).await;

    let api = Api::new(server.uri(), "test-client-id", "test-client-secret");
    assert_eq!(api.get_org_email().await.unwrap(), "admin@example.com");
}

#[tokio::test]
async fn test_get_org_email_unset_reads_empty() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_organization(&server, None).await;

    let api = Api::new(server.uri(), "test-client-id", "test-client-secret");
    assert_eq!(api.get_org_email().await.unwrap(), "");
}

#[tokio::test]
async fn test_set_org_email_preserves_organization_name() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    mock_organization(&server, Some("old@example.com")).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/update"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "organizationId": "00000000-0000-0000-0000-000000000000",
            "organizationName": "Airbyte",
            "email": "new@example.com",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::new(server.uri(), "test-client-id", "test-client-secret");
    api.set_org_email("new@example.com").await.unwrap();
}

#[tokio::test]
async fn test_token_failure_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/applications/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = Api::new(server.uri(), "bad-id", "bad-secret");
    let err = api.organization().await.unwrap_err();
    match err {
        ApiError::Status { status, endpoint } => {
            assert_eq!(status, 401);
            assert!(endpoint.ends_with("/api/v1/applications/token"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    // Port 1 is never listening.
    let api = Api::new("http://127.0.0.1:1", "id", "secret");
    let err = api.token().await.unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }));
}

#[test]
fn test_base_url_trailing_slash_is_trimmed() {
    let api = Api::new("http://localhost:8000/", "id", "secret");
    assert_eq!(api.base_url, "http://localhost:8000");
}
