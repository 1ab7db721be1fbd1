// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster target resolution.
//!
//! A [`Provider`] pins the kubeconfig path, context, and cluster name a
//! command targets. It is resolved once per invocation and never changes
//! afterwards; every client built from it talks to exactly that cluster.

use crate::constants::{
    CONTROL_PLANE_SUFFIX, DEFAULT_CLUSTER_NAME, DEFAULT_CONTEXT, DEFAULT_KUBECONFIG,
    INGRESS_CONTAINER_PORT,
};
use crate::docker::RuntimeProbe;
use crate::local_errors::LocalError;
use anyhow::Result;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::debug;

/// Identifies the cluster a command invocation targets.
#[derive(Clone, Debug)]
pub struct Provider {
    pub cluster_name: String,
    pub context: String,
    pub kubeconfig: PathBuf,
}

impl Provider {
    /// The default kind-backed provider.
    #[must_use]
    pub fn kind() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default();
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.into(),
            context: DEFAULT_CONTEXT.into(),
            kubeconfig: home.join(DEFAULT_KUBECONFIG),
        }
    }

    /// Name of the kind control-plane node container backing this cluster.
    #[must_use]
    pub fn control_plane_container(&self) -> String {
        format!("{}{CONTROL_PLANE_SUFFIX}", self.cluster_name)
    }

    /// Build a connected Kubernetes client for the configured context.
    ///
    /// Any failure here means the cluster cannot be reached or configured,
    /// so it is classified as [`LocalError::Kubernetes`].
    pub async fn kube_client(&self) -> Result<Client, LocalError> {
        debug!(kubeconfig = %self.kubeconfig.display(), context = %self.context, "building kube client");
        let kubeconfig =
            Kubeconfig::read_from(&self.kubeconfig).map_err(LocalError::kubernetes)?;
        let options = KubeConfigOptions {
            context: Some(self.context.clone()),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(LocalError::kubernetes)?;
        Client::try_from(config).map_err(LocalError::kubernetes)
    }

    /// Resolve the named cluster through the container runtime.
    pub async fn cluster(&self, probe: &dyn RuntimeProbe) -> Result<KindCluster, LocalError> {
        let container = self.control_plane_container();
        let exists = probe
            .container_exists(&container)
            .await
            .map_err(LocalError::kubernetes)?;
        Ok(KindCluster {
            name: self.cluster_name.clone(),
            exists,
        })
    }

    /// Externally reachable port of the installed application's HTTP
    /// endpoint, read from the control-plane container's published ports.
    pub async fn resolve_port(&self, probe: &dyn RuntimeProbe) -> Result<u16> {
        probe
            .mapped_port(&self.control_plane_container(), INGRESS_CONTAINER_PORT)
            .await
    }
}

/// A resolved kind cluster.
#[derive(Debug)]
pub struct KindCluster {
    name: String,
    exists: bool,
}

impl KindCluster {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the cluster exists on this machine.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
