// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Sentinel error categories for abctl.
//!
//! Every low-level failure that should change the guidance shown to the user
//! is wrapped into one of the categories here before it reaches the command
//! boundary. All other failures propagate with contextual wrapping only and
//! surface as opaque operational errors.

use thiserror::Error;

/// Help text displayed when [`LocalError::Docker`] reaches the command boundary.
pub const HELP_DOCKER: &str = "An error occurred while communicating with the Docker daemon.
Ensure that Docker is running and is accessible.  You may need to upgrade to a newer version of Docker.
For additional help please visit https://docs.docker.com/get-docker/";

/// Help text displayed when [`LocalError::Kubernetes`] reaches the command boundary.
pub const HELP_KUBERNETES: &str = "An error occurred while communicating with the Kubernetes cluster.
If using Docker Desktop, ensure that Kubernetes is enabled.
For additional help please visit https://docs.docker.com/desktop/kubernetes/";

/// Failure categories that map to remediation guidance.
///
/// The variants carry the underlying cause so diagnostic detail is preserved
/// in the error chain while classification stays a tagged match rather than
/// string comparison.
#[derive(Error, Debug)]
pub enum LocalError {
    /// The container runtime could not be reached.
    #[error("unable to communicate with the docker daemon")]
    Docker(#[source] anyhow::Error),

    /// The Kubernetes cluster could not be reached or configured.
    #[error("unable to communicate with the kubernetes cluster")]
    Kubernetes(#[source] anyhow::Error),
}

impl LocalError {
    /// Wrap a failure as a dependency-unreachable error.
    pub fn docker(err: impl Into<anyhow::Error>) -> Self {
        LocalError::Docker(err.into())
    }

    /// Wrap a failure as a cluster-unreachable error.
    pub fn kubernetes(err: impl Into<anyhow::Error>) -> Self {
        LocalError::Kubernetes(err.into())
    }

    /// Remediation text for this category.
    #[must_use]
    pub fn help(&self) -> &'static str {
        match self {
            LocalError::Docker(_) => HELP_DOCKER,
            LocalError::Kubernetes(_) => HELP_KUBERNETES,
        }
    }

    /// Find the sentinel category inside an error chain, if any.
    ///
    /// Walks the chain so classification keeps working no matter how many
    /// context layers were added on the way up.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Option<&LocalError> {
        err.chain().find_map(|cause| cause.downcast_ref::<LocalError>())
    }
}

#[cfg(test)]
#[path = "local_errors_tests.rs"]
mod local_errors_tests;
