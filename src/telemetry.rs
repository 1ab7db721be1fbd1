// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operation event envelope for telemetry correlation.
//!
//! Each top-level flow is wrapped in a start/success/failure envelope keyed
//! by an [`EventType`]. The envelope is independent of business logic and
//! best-effort: a telemetry failure never fails the wrapped flow. The actual
//! transport lives behind the [`Client`] trait; this crate ships only the
//! [`NoopClient`].

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Operation identifiers used purely for telemetry correlation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Install,
    Uninstall,
    Status,
    Credentials,
    Deploy,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Install => "install",
            EventType::Uninstall => "uninstall",
            EventType::Status => "status",
            EventType::Credentials => "credentials",
            EventType::Deploy => "deploy",
        };
        f.write_str(name)
    }
}

/// Telemetry transport contract.
#[async_trait]
pub trait Client: Send + Sync {
    /// Record the start of an operation.
    async fn start(&self, event: EventType) -> Result<()>;

    /// Record the successful completion of an operation.
    async fn success(&self, event: EventType) -> Result<()>;

    /// Record a failed operation along with its terminal error.
    async fn failure(&self, event: EventType, error: &anyhow::Error) -> Result<()>;

    /// Attach a diagnostic attribute to subsequent events.
    fn attr(&self, key: &str, value: &str);
}

/// Telemetry client whose methods are all no-ops.
pub struct NoopClient;

#[async_trait]
impl Client for NoopClient {
    async fn start(&self, _: EventType) -> Result<()> {
        Ok(())
    }

    async fn success(&self, _: EventType) -> Result<()> {
        Ok(())
    }

    async fn failure(&self, _: EventType, _: &anyhow::Error) -> Result<()> {
        Ok(())
    }

    fn attr(&self, _: &str, _: &str) {}
}

/// Run `fut` inside a start/success/failure envelope.
///
/// Telemetry calls are best-effort; only the wrapped future decides the
/// outcome of the operation.
pub async fn wrap<T, F>(client: &dyn Client, event: EventType, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let _ = client.start(event).await;
    match fut.await {
        Ok(value) => {
            let _ = client.success(event).await;
            Ok(value)
        }
        Err(err) => {
            let _ = client.failure(event, &err).await;
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod telemetry_tests;
