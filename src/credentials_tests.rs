// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `credentials.rs`

use super::*;
use crate::provider::Provider;
use crate::test_support::{
    make_secret, FakeClient, FakeOrgApi, FakeProbe, RecordingReporter, RecordingTelemetry,
};
use std::sync::atomic::Ordering;

fn auth_secret(password: &str) -> Secret {
    make_secret(
        AIRBYTE_NAMESPACE,
        AIRBYTE_AUTH_SECRET_NAME,
        &[
            (SECRET_PASSWORD_KEY, password),
            (SECRET_CLIENT_ID_KEY, "the-client-id"),
            (SECRET_CLIENT_SECRET_KEY, "the-client-secret"),
        ],
    )
}

fn args(email: Option<&str>, password: Option<&str>) -> CredentialsArgs {
    CredentialsArgs {
        email: email.map(str::to_string),
        password: password.map(str::to_string),
    }
}

#[tokio::test]
async fn test_display_without_mutation() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("admin@example.com");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(None, None),
        &client,
        |id, secret| {
            api.record_credentials(id, secret);
            api.clone()
        },
        &reporter,
    )
    .await
    .unwrap();

    // The API is constructed with the credentials read from the secret.
    assert_eq!(
        api.credentials().unwrap(),
        ("the-client-id".to_string(), "the-client-secret".to_string())
    );
    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 0);
    assert_eq!(client.restarts.load(Ordering::SeqCst), 0);
    assert!(reporter.contains("Email: admin@example.com"));
    assert!(reporter.contains("Password: hunter2"));
    assert!(reporter.contains("Client-Id: the-client-id"));
    assert!(reporter.contains("Client-Secret: the-client-secret"));
}

#[tokio::test]
async fn test_equal_password_is_a_no_op() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(None, Some("hunter2")),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 0);
    assert_eq!(client.restarts.load(Ordering::SeqCst), 0);
    assert_eq!(client.secret_gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_changed_password_writes_restarts_and_refetches_once() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("admin@example.com");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(None, Some("correct-horse")),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 1);
    assert_eq!(client.restarts.load(Ordering::SeqCst), 1);
    // Initial fetch plus exactly one re-fetch after the restart.
    assert_eq!(client.secret_gets.load(Ordering::SeqCst), 2);
    assert!(reporter.contains("Password: correct-horse"));
}

#[tokio::test]
async fn test_displayed_password_is_the_refetched_value() {
    // Script the re-read to disagree with the written value; the display must
    // follow the cluster of record, never the in-memory copy.
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    client
        .scripted_gets
        .lock()
        .unwrap()
        .extend([auth_secret("hunter2"), auth_secret("normalized-by-server")]);
    let api = FakeOrgApi::with_email("");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(None, Some("correct-horse")),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert!(reporter.contains("Password: normalized-by-server"));
    assert!(!reporter.contains("Password: correct-horse"));
}

#[tokio::test]
async fn test_email_only_touches_only_the_org_api() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("old@example.com");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(Some("a@b.com"), None),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(api.set_calls(), vec!["a@b.com".to_string()]);
    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 0);
    assert_eq!(client.restarts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_email_push_precedes_password_handling() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(Some("a@b.com"), Some("correct-horse")),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(api.set_calls(), vec!["a@b.com".to_string()]);
    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 1);
    let lines = reporter.lines();
    let email_at = lines.iter().position(|l| l == "Email updated").unwrap();
    let password_at = lines.iter().position(|l| l == "Password updated").unwrap();
    assert!(email_at < password_at);
}

#[tokio::test]
async fn test_empty_arguments_are_ignored() {
    // Empty strings behave like absent flags, mirroring the CLI contract.
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("");
    let reporter = RecordingReporter::default();

    run_flow(
        &args(Some(""), Some("")),
        &client,
        |_, _| api.clone(),
        &reporter,
    )
    .await
    .unwrap();

    assert!(api.set_calls().is_empty());
    assert_eq!(client.secret_writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unset_org_email_displays_sentinel() {
    let client = FakeClient::new().with_secret(auth_secret("hunter2"));
    let api = FakeOrgApi::with_email("");
    let reporter = RecordingReporter::default();

    run_flow(&args(None, None), &client, |_, _| api.clone(), &reporter)
        .await
        .unwrap();

    assert!(reporter.contains("Email: [not set]"));
}

#[tokio::test]
async fn test_missing_secret_propagates() {
    let client = FakeClient::new();
    let api = FakeOrgApi::default();
    let reporter = RecordingReporter::default();

    let err = run_flow(&args(None, None), &client, |_, _| api.clone(), &reporter)
        .await
        .unwrap_err();

    assert!(err.to_string().contains(AIRBYTE_AUTH_SECRET_NAME));
}

#[tokio::test]
async fn test_unresolvable_cluster_is_a_success_exit() {
    let provider = Provider {
        cluster_name: "airbyte-abctl".into(),
        context: "kind-airbyte-abctl".into(),
        kubeconfig: "/nonexistent/abctl.kubeconfig".into(),
    };
    let probe = FakeProbe::healthy();
    let telemetry = RecordingTelemetry::default();
    let reporter = RecordingReporter::default();

    run(&args(None, None), &provider, &probe, &telemetry, &reporter)
        .await
        .unwrap();

    assert!(reporter.contains("No existing cluster found"));
    assert_eq!(telemetry.starts(), vec![EventType::Credentials]);
    assert_eq!(telemetry.successes(), vec![EventType::Credentials]);
}
