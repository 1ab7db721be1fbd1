// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `telemetry.rs`

use super::*;
use crate::test_support::RecordingTelemetry;

#[tokio::test]
async fn test_wrap_success_records_envelope() {
    let telemetry = RecordingTelemetry::default();

    let result = wrap(&telemetry, EventType::Status, async { Ok(42) }).await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(telemetry.starts(), vec![EventType::Status]);
    assert_eq!(telemetry.successes(), vec![EventType::Status]);
    assert!(telemetry.failures().is_empty());
}

#[tokio::test]
async fn test_wrap_failure_records_envelope_and_propagates() {
    let telemetry = RecordingTelemetry::default();

    let result: Result<()> = wrap(&telemetry, EventType::Credentials, async {
        anyhow::bail!("boom")
    })
    .await;

    assert!(result.is_err());
    assert_eq!(telemetry.starts(), vec![EventType::Credentials]);
    assert!(telemetry.successes().is_empty());
    assert_eq!(telemetry.failures(), vec![EventType::Credentials]);
}

#[tokio::test]
async fn test_wrap_telemetry_failure_does_not_fail_flow() {
    let telemetry = RecordingTelemetry::failing();

    let result = wrap(&telemetry, EventType::Status, async { Ok("ok") }).await;

    assert_eq!(result.unwrap(), "ok");
}

#[tokio::test]
async fn test_noop_client() {
    let client = NoopClient;
    assert!(client.start(EventType::Install).await.is_ok());
    assert!(client.success(EventType::Install).await.is_ok());
    assert!(client
        .failure(EventType::Install, &anyhow::anyhow!("x"))
        .await
        .is_ok());
    client.attr("key", "value");
}

#[test]
fn test_event_type_display() {
    assert_eq!(EventType::Status.to_string(), "status");
    assert_eq!(EventType::Credentials.to_string(), "credentials");
    assert_eq!(EventType::Install.to_string(), "install");
}
