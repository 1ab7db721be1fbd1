// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for abctl.
//!
//! This module contains the wire-level identifiers used throughout the
//! codebase. Constants are organized by category for easy maintenance.

// ============================================================================
// Cluster Constants
// ============================================================================

/// Name of the kind cluster hosting the local Airbyte installation
pub const DEFAULT_CLUSTER_NAME: &str = "airbyte-abctl";

/// Kubeconfig context for the kind cluster
pub const DEFAULT_CONTEXT: &str = "kind-airbyte-abctl";

/// Kubeconfig location relative to the user's home directory
pub const DEFAULT_KUBECONFIG: &str = ".airbyte/abctl/abctl.kubeconfig";

/// Suffix kind appends to the control-plane node container name
pub const CONTROL_PLANE_SUFFIX: &str = "-control-plane";

/// Container port the ingress controller listens on inside the cluster node
pub const INGRESS_CONTAINER_PORT: u16 = 80;

// ============================================================================
// Resource Constants
// ============================================================================

/// Namespace holding all Airbyte resources
pub const AIRBYTE_NAMESPACE: &str = "airbyte-abctl";

/// Name of the authentication secret
pub const AIRBYTE_AUTH_SECRET_NAME: &str = "airbyte-auth-secrets";

/// Secret key holding the instance admin password
pub const SECRET_PASSWORD_KEY: &str = "instance-admin-password";

/// Secret key holding the instance admin client id
pub const SECRET_CLIENT_ID_KEY: &str = "instance-admin-client-id";

/// Secret key holding the instance admin client secret
pub const SECRET_CLIENT_SECRET_KEY: &str = "instance-admin-client-secret";

/// Name of the server deployment restarted after a password rotation
pub const SERVER_DEPLOYMENT_NAME: &str = "airbyte-abctl-server";

/// Name of the webapp service exposing the Airbyte UI
pub const WEBAPP_SERVICE_NAME: &str = "airbyte-abctl-airbyte-webapp-svc";

// ============================================================================
// Storage Constants
// ============================================================================

/// Size of the disks created by the persistent volumes and requested by the
/// persistent volume claims
pub const PERSISTENT_VOLUME_SIZE: &str = "500Mi";

/// Storage class assigned to volumes and claims
pub const STORAGE_CLASS: &str = "standard";

/// Access mode assigned to volumes and claims
pub const ACCESS_MODE_READ_WRITE_ONCE: &str = "ReadWriteOnce";

/// Reclaim policy assigned to persistent volumes
pub const RECLAIM_POLICY_RETAIN: &str = "Retain";

/// Host directory backing persistent volumes on the cluster node
pub const HOST_PATH_PROVISIONER: &str = "/var/local-path-provisioner";

// ============================================================================
// Remote API Constants
// ============================================================================

/// Organization id of the default (single-tenant) organization
pub const DEFAULT_ORG_ID: &str = "00000000-0000-0000-0000-000000000000";
