// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Installation status check flow.
//!
//! Two independent gates, both mandatory, short-circuiting on first failure:
//!
//! 1. Dependency gate: the container runtime must be reachable. The probed
//!    version, architecture, and platform are recorded as telemetry
//!    attributes but never change control flow.
//! 2. Cluster gate: resolve the named cluster. A cluster that does not exist
//!    is a normal "not installed" outcome. An existing cluster gets the
//!    externally reachable port resolved and deep validation delegated to
//!    [`crate::local::Command`], whose failure surfaces unmodified.

use crate::docker::RuntimeProbe;
use crate::k8s::DefaultClient;
use crate::local;
use crate::local_errors::LocalError;
use crate::provider::Provider;
use crate::reporter::Reporter;
use crate::telemetry::{self, EventType};
use anyhow::Result;

/// Run the status command against the resolved provider.
pub async fn run(
    provider: &Provider,
    probe: &dyn RuntimeProbe,
    telemetry: &dyn telemetry::Client,
    reporter: &dyn Reporter,
) -> Result<()> {
    check_docker(probe, telemetry, reporter).await?;

    telemetry::wrap(
        telemetry,
        EventType::Status,
        status(provider, probe, telemetry, reporter),
    )
    .await
}

/// The dependency gate. Runs before any cluster call.
async fn check_docker(
    probe: &dyn RuntimeProbe,
    telemetry: &dyn telemetry::Client,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.phase("Starting status check");
    reporter.phase("Checking for Docker installation");

    let version = probe.version().await.map_err(|err| {
        reporter.error("Unable to determine if Docker is installed");
        LocalError::docker(err)
    })?;

    telemetry.attr("docker_version", &version.version);
    telemetry.attr("docker_arch", &version.arch);
    telemetry.attr("docker_platform", &version.platform);

    Ok(())
}

/// The cluster gate and deep validation.
async fn status(
    provider: &Provider,
    probe: &dyn RuntimeProbe,
    telemetry: &dyn telemetry::Client,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.phase(&format!(
        "Checking for existing Kubernetes cluster '{}'",
        provider.cluster_name
    ));

    let cluster = provider.cluster(probe).await.map_err(|err| {
        reporter.error(&format!(
            "Unable to determine status of any existing '{}' cluster",
            provider.cluster_name
        ));
        err
    })?;

    if !cluster.exists() {
        reporter.warn("Airbyte does not appear to be installed locally");
        return Ok(());
    }

    reporter.success(&format!(
        "Existing cluster '{}' found",
        provider.cluster_name
    ));
    reporter.phase(&format!(
        "Validating existing cluster '{}'",
        provider.cluster_name
    ));

    let port = provider.resolve_port(probe).await?;
    let kube = provider.kube_client().await?;
    let client = DefaultClient::new(kube);

    let command = local::Command::new(&client, telemetry, reporter, port);
    command.status().await
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
