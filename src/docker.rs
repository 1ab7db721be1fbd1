// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Container runtime probe.
//!
//! abctl talks to Docker for three things: confirming the daemon is reachable
//! before any cluster work, checking whether the kind control-plane container
//! exists, and resolving the host port published by that container. All three
//! go through the `docker` CLI so no daemon socket plumbing is required.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// Version information reported by the container runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    pub version: String,
    pub arch: String,
    pub platform: String,
}

/// Capability contract for the container runtime.
///
/// Flows depend on this trait instead of the `docker` binary so the
/// dependency gate and port resolution are testable without a runtime.
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    /// Version, architecture, and platform of the runtime, or an error if the
    /// daemon is unreachable.
    async fn version(&self) -> Result<Version>;

    /// Whether a container with the given name exists (running or not).
    async fn container_exists(&self, name: &str) -> Result<bool>;

    /// Host port published for `internal_port/tcp` on the given container.
    async fn mapped_port(&self, name: &str, internal_port: u16) -> Result<u16>;
}

/// Runtime probe backed by the `docker` CLI.
pub struct DockerCli;

#[async_trait]
impl RuntimeProbe for DockerCli {
    async fn version(&self) -> Result<Version> {
        let output = Command::new("docker")
            .args(["version", "--format", "{{json .}}"])
            .output()
            .await
            .context("could not execute docker")?;

        if !output.status.success() {
            return Err(anyhow!(
                "docker version failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_version(&String::from_utf8_lossy(&output.stdout))
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        let output = Command::new("docker")
            .args(["inspect", "--type", "container", name])
            .output()
            .await
            .context("could not execute docker")?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such") {
            debug!(container = name, "container not found");
            return Ok(false);
        }

        Err(anyhow!("docker inspect {name} failed: {}", stderr.trim()))
    }

    async fn mapped_port(&self, name: &str, internal_port: u16) -> Result<u16> {
        let output = Command::new("docker")
            .args(["port", name, &format!("{internal_port}/tcp")])
            .output()
            .await
            .context("could not execute docker")?;

        if !output.status.success() {
            return Err(anyhow!(
                "docker port {name} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_port(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("could not determine the published port of {name}"))
    }
}

/// Parse the output of `docker version --format '{{json .}}'`.
pub(crate) fn parse_version(raw: &str) -> Result<Version> {
    #[derive(Deserialize)]
    struct Output {
        #[serde(rename = "Server")]
        server: Option<Server>,
    }

    #[derive(Deserialize)]
    struct Server {
        #[serde(rename = "Version")]
        version: String,
        #[serde(rename = "Arch")]
        arch: String,
        #[serde(rename = "Platform")]
        platform: Option<Platform>,
    }

    #[derive(Deserialize)]
    struct Platform {
        #[serde(rename = "Name")]
        name: String,
    }

    let output: Output =
        serde_json::from_str(raw.trim()).context("could not parse docker version output")?;
    let server = output
        .server
        .ok_or_else(|| anyhow!("docker version output has no server section"))?;

    Ok(Version {
        version: server.version,
        arch: server.arch,
        platform: server.platform.map(|p| p.name).unwrap_or_default(),
    })
}

/// Parse the output of `docker port <name> <port>/tcp`.
///
/// The command prints one binding per line, e.g. `0.0.0.0:8000`; the first
/// binding wins.
pub(crate) fn parse_port(raw: &str) -> Result<u16> {
    let line = raw
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow!("no port binding reported"))?;
    let port = line
        .rsplit(':')
        .next()
        .ok_or_else(|| anyhow!("malformed port binding: {line}"))?;
    port.trim()
        .parse()
        .with_context(|| format!("malformed port binding: {line}"))
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod docker_tests;
