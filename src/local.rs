// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deep installation health validation.
//!
//! [`Command`] is the orchestration handle the status flow constructs once a
//! cluster is known to exist. It is scoped to the externally resolved HTTP
//! port and validates that the pieces a working installation depends on are
//! actually present.

use crate::constants::{AIRBYTE_AUTH_SECRET_NAME, AIRBYTE_NAMESPACE, WEBAPP_SERVICE_NAME};
use crate::k8s;
use crate::reporter::Reporter;
use crate::telemetry;
use anyhow::{Context, Result};

/// Orchestration handle for an existing installation.
pub struct Command<'a> {
    client: &'a dyn k8s::Client,
    telemetry: &'a dyn telemetry::Client,
    reporter: &'a dyn Reporter,
    port: u16,
}

impl<'a> Command<'a> {
    #[must_use]
    pub fn new(
        client: &'a dyn k8s::Client,
        telemetry: &'a dyn telemetry::Client,
        reporter: &'a dyn Reporter,
        port: u16,
    ) -> Self {
        Self {
            client,
            telemetry,
            reporter,
            port,
        }
    }

    /// Validate the installation.
    ///
    /// Checks the API server, the authentication secret, and the webapp
    /// service. Any failure surfaces unmodified as the terminal failure of
    /// the status flow.
    pub async fn status(&self) -> Result<()> {
        let version = self.client.server_version().await?;
        self.telemetry.attr("k8s_version", &version);
        self.reporter
            .phase(&format!("Kubernetes server version {version}"));

        self.client
            .secret_get(AIRBYTE_NAMESPACE, AIRBYTE_AUTH_SECRET_NAME)
            .await
            .context("the authentication secret is missing or unreadable")?;

        self.client
            .service_get(AIRBYTE_NAMESPACE, WEBAPP_SERVICE_NAME)
            .await
            .context("the webapp service is missing or unreadable")?;

        self.reporter.success(&format!(
            "Airbyte is installed and reachable at http://localhost:{}",
            self.port
        ));
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod local_tests;
