// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `k8s.rs`

use super::*;
use crate::test_support::{make_secret, FakeClient};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

fn api_error(code: u16) -> kube::Error {
    kube::Error::Api(Box::new(kube::error::ErrorResponse {
        status: Some(kube::core::response::StatusSummary::Failure),
        message: format!("error {code}"),
        reason: String::new(),
        code,
        metadata: None,
        details: None,
    }))
}

#[test]
fn test_is_not_found_on_404() {
    assert!(is_not_found(&api_error(404)));
}

#[test]
fn test_is_not_found_rejects_other_codes() {
    // Ambiguous errors must not read as "not found"; existence checks fail
    // open on them.
    assert!(!is_not_found(&api_error(403)));
    assert!(!is_not_found(&api_error(500)));
    assert!(!is_not_found(&api_error(503)));
}

#[test]
fn test_secret_value() {
    let secret = make_secret("ns", "creds", &[("password", "hunter2")]);
    assert_eq!(secret_value(&secret, "password"), "hunter2");
    assert_eq!(secret_value(&secret, "missing"), "");
}

#[test]
fn test_secret_value_no_data() {
    let secret = k8s_openapi::api::core::v1::Secret::default();
    assert_eq!(secret_value(&secret, "password"), "");
}

// ----------------------------------------------------------------------------
// Log stream buffering
// ----------------------------------------------------------------------------

/// Reader that counts its own release and optionally fails mid-copy.
struct TrackedReader {
    data: io::Cursor<Vec<u8>>,
    fail: bool,
    closed: Arc<AtomicUsize>,
}

impl TrackedReader {
    fn new(content: &str, fail: bool, closed: Arc<AtomicUsize>) -> Self {
        Self {
            data: io::Cursor::new(content.as_bytes().to_vec()),
            fail,
            closed,
        }
    }
}

impl futures::AsyncRead for TrackedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.fail {
            return Poll::Ready(Err(io::Error::other("stream interrupted")));
        }
        Poll::Ready(std::io::Read::read(&mut this.data, buf))
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_buffer_logs_success_releases_stream() {
    let closed = Arc::new(AtomicUsize::new(0));
    let reader = TrackedReader::new("log line one\nlog line two\n", false, closed.clone());

    let logs = buffer_logs("airbyte-abctl-server-0", reader).await.unwrap();

    assert_eq!(logs, "log line one\nlog line two\n");
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_buffer_logs_copy_failure_releases_stream_and_names_pod() {
    let closed = Arc::new(AtomicUsize::new(0));
    let reader = TrackedReader::new("unused", true, closed.clone());

    let err = buffer_logs("airbyte-abctl-server-0", reader)
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .contains("could not copy logs from pod airbyte-abctl-server-0"));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

// ----------------------------------------------------------------------------
// Client contract, exercised against the in-memory backing store
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_exists_false_then_create_succeeds() {
    let client = FakeClient::new();

    assert!(!client.namespace_exists("airbyte-abctl").await);
    client.namespace_create("airbyte-abctl").await.unwrap();
    assert!(client.namespace_exists("airbyte-abctl").await);

    assert!(!client.persistent_volume_exists("", "airbyte-volume-db").await);
    client
        .persistent_volume_create("airbyte-abctl", "airbyte-volume-db")
        .await
        .unwrap();
    assert!(client.persistent_volume_exists("", "airbyte-volume-db").await);
}

#[tokio::test]
async fn test_create_is_not_idempotent() {
    let client = FakeClient::new();

    client.namespace_create("airbyte-abctl").await.unwrap();
    assert!(client.namespace_create("airbyte-abctl").await.is_err());
}

#[tokio::test]
async fn test_delete_propagates_not_found() {
    let client = FakeClient::new();

    assert!(client.namespace_delete("missing").await.is_err());
    assert!(client
        .persistent_volume_delete("", "missing")
        .await
        .is_err());
    assert!(client
        .persistent_volume_claim_delete("airbyte-abctl", "missing", "vol")
        .await
        .is_err());
}

#[tokio::test]
async fn test_secret_create_or_update_is_idempotent() {
    let client = FakeClient::new();
    let secret = make_secret(
        "airbyte-abctl",
        "airbyte-auth-secrets",
        &[("instance-admin-password", "hunter2")],
    );

    client.secret_create_or_update(secret.clone()).await.unwrap();
    let first = client
        .stored_secret("airbyte-abctl", "airbyte-auth-secrets")
        .unwrap();

    client.secret_create_or_update(secret).await.unwrap();
    let second = client
        .stored_secret("airbyte-abctl", "airbyte-auth-secrets")
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_claim_existence_ignores_volume_name() {
    // A claim is looked up purely by name and namespace. A claim bound to a
    // different volume than the caller expects still reads as "exists".
    let client = FakeClient::new();
    client
        .persistent_volume_claim_create("airbyte-abctl", "airbyte-minio-pv-claim", "vol-a")
        .await
        .unwrap();

    assert!(
        client
            .persistent_volume_claim_exists("airbyte-abctl", "airbyte-minio-pv-claim", "vol-b")
            .await
    );
    client
        .persistent_volume_claim_delete("airbyte-abctl", "airbyte-minio-pv-claim", "vol-b")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ingress_create_and_update_are_distinct() {
    let client = FakeClient::new();
    let ingress = Ingress {
        metadata: ObjectMeta {
            name: Some("ingress-abctl".into()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Update before create fails; the caller must know which applies.
    assert!(client
        .ingress_update("airbyte-abctl", ingress.clone())
        .await
        .is_err());
    client
        .ingress_create("airbyte-abctl", ingress.clone())
        .await
        .unwrap();
    assert!(client.ingress_exists("airbyte-abctl", "ingress-abctl").await);
    client
        .ingress_update("airbyte-abctl", ingress.clone())
        .await
        .unwrap();
    assert!(client
        .ingress_create("airbyte-abctl", ingress)
        .await
        .is_err());
}
