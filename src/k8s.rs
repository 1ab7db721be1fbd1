// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Capability-set client over the Kubernetes API.
//!
//! The [`Client`] trait is the narrow interface the flows are written
//! against; [`DefaultClient`] adapts it onto a connected [`kube::Client`].
//! The trait has no business logic: it translates existence, create, update,
//! and delete semantics into API calls and normalizes "not found" into a
//! boolean instead of an error.
//!
//! # Failure semantics
//!
//! - Existence checks fail open: any error that is not a confirmed 404 reads
//!   as "assume present", biasing callers away from duplicate-create attempts.
//! - Creates and deletes are not idempotent. Callers check existence before
//!   creating, and must tolerate a not-found failure on delete themselves if
//!   they need idempotent deletion.
//! - [`Client::secret_create_or_update`] is the one genuinely idempotent
//!   write: read first, update if present, create on a confirmed 404, and
//!   surface any other read error with the secret name embedded.
//! - No operation retries internally; retry policy belongs to the caller.

use crate::constants::{
    ACCESS_MODE_READ_WRITE_ONCE, HOST_PATH_PROVISIONER, PERSISTENT_VOLUME_SIZE,
    RECLAIM_POLICY_RETAIN, STORAGE_CLASS,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{AsyncRead, AsyncReadExt, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    HostPathVolumeSource, Namespace, PersistentVolume, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeSpec, Pod, Secret, Service,
    VolumeResourceRequirements,
};
use k8s_openapi::api::events::v1::Event;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, LogParams, Patch, PatchParams, PostParams, WatchEvent, WatchParams};
use kube::Api;
use std::collections::BTreeMap;
use tracing::debug;

/// Live event subscription handle. Dropping the stream releases the
/// server-side watch.
pub type EventStream = BoxStream<'static, Result<WatchEvent<Event>, kube::Error>>;

/// Narrow interface over the cluster API, primarily for testing purposes.
#[async_trait]
pub trait Client: Send + Sync {
    /// Create an ingress in the given namespace.
    async fn ingress_create(&self, namespace: &str, ingress: Ingress) -> Result<()>;
    /// Returns true if the ingress exists in the namespace, false otherwise.
    async fn ingress_exists(&self, namespace: &str, name: &str) -> bool;
    /// Update an existing ingress in the given namespace.
    async fn ingress_update(&self, namespace: &str, ingress: Ingress) -> Result<()>;

    /// Create a namespace.
    async fn namespace_create(&self, name: &str) -> Result<()>;
    /// Returns true if the namespace exists, false otherwise.
    async fn namespace_exists(&self, name: &str) -> bool;
    /// Delete the existing namespace.
    async fn namespace_delete(&self, name: &str) -> Result<()>;

    async fn persistent_volume_create(&self, namespace: &str, name: &str) -> Result<()>;
    async fn persistent_volume_exists(&self, namespace: &str, name: &str) -> bool;
    async fn persistent_volume_delete(&self, namespace: &str, name: &str) -> Result<()>;

    async fn persistent_volume_claim_create(
        &self,
        namespace: &str,
        name: &str,
        volume_name: &str,
    ) -> Result<()>;
    async fn persistent_volume_claim_exists(
        &self,
        namespace: &str,
        name: &str,
        volume_name: &str,
    ) -> bool;
    async fn persistent_volume_claim_delete(
        &self,
        namespace: &str,
        name: &str,
        volume_name: &str,
    ) -> Result<()>;

    /// Fetch a secret.
    async fn secret_get(&self, namespace: &str, name: &str) -> Result<Secret>;
    /// Update or create the secret with the given payload.
    async fn secret_create_or_update(&self, secret: Secret) -> Result<()>;

    /// Trigger a rollout restart of a deployment.
    async fn deployment_restart(&self, namespace: &str, name: &str) -> Result<()>;

    /// Return the service for the given namespace and name.
    async fn service_get(&self, namespace: &str, name: &str) -> Result<Service>;

    /// Return the Kubernetes server version. Single round trip, no retry.
    async fn server_version(&self) -> Result<String>;

    /// Subscribe to events in a namespace. The caller owns the stream and
    /// must drop it to release server-side watch resources.
    async fn events_watch(&self, namespace: &str) -> Result<EventStream>;

    /// Fetch and fully buffer the logs of a pod.
    async fn logs_get(&self, namespace: &str, name: &str) -> Result<String>;
}

/// Whether a kube error is a confirmed not-found response.
fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

/// Adapter converting the official kube client to the more manageable (and
/// testable) [`Client`] interface.
pub struct DefaultClient {
    client: kube::Client,
}

impl DefaultClient {
    #[must_use]
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn ingresses(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    fn persistent_volumes(&self) -> Api<PersistentVolume> {
        Api::all(self.client.clone())
    }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl Client for DefaultClient {
    async fn ingress_create(&self, namespace: &str, ingress: Ingress) -> Result<()> {
        let name = ingress.metadata.name.clone().unwrap_or_default();
        self.ingresses(namespace)
            .create(&PostParams::default(), &ingress)
            .await
            .with_context(|| format!("could not create the ingress {name}"))?;
        Ok(())
    }

    async fn ingress_exists(&self, namespace: &str, name: &str) -> bool {
        match self.ingresses(namespace).get(name).await {
            Ok(_) => true,
            Err(err) => !is_not_found(&err),
        }
    }

    async fn ingress_update(&self, namespace: &str, ingress: Ingress) -> Result<()> {
        let name = ingress.metadata.name.clone().unwrap_or_default();
        self.ingresses(namespace)
            .replace(&name, &PostParams::default(), &ingress)
            .await
            .with_context(|| format!("could not update the ingress {name}"))?;
        Ok(())
    }

    async fn namespace_create(&self, name: &str) -> Result<()> {
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.namespaces()
            .create(&PostParams::default(), &namespace)
            .await
            .with_context(|| format!("could not create the namespace {name}"))?;
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> bool {
        match self.namespaces().get(name).await {
            Ok(_) => true,
            Err(err) => !is_not_found(&err),
        }
    }

    async fn namespace_delete(&self, name: &str) -> Result<()> {
        self.namespaces()
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("could not delete the namespace {name}"))?;
        Ok(())
    }

    async fn persistent_volume_create(&self, namespace: &str, name: &str) -> Result<()> {
        let mut capacity = BTreeMap::new();
        capacity.insert(
            "storage".to_string(),
            Quantity(PERSISTENT_VOLUME_SIZE.into()),
        );

        let volume = PersistentVolume {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeSpec {
                capacity: Some(capacity),
                host_path: Some(HostPathVolumeSource {
                    path: format!("{HOST_PATH_PROVISIONER}/{name}"),
                    type_: Some("DirectoryOrCreate".into()),
                }),
                access_modes: Some(vec![ACCESS_MODE_READ_WRITE_ONCE.into()]),
                persistent_volume_reclaim_policy: Some(RECLAIM_POLICY_RETAIN.into()),
                storage_class_name: Some(STORAGE_CLASS.into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.persistent_volumes()
            .create(&PostParams::default(), &volume)
            .await
            .with_context(|| format!("could not create the persistent volume {name}"))?;
        Ok(())
    }

    async fn persistent_volume_exists(&self, _namespace: &str, name: &str) -> bool {
        match self.persistent_volumes().get(name).await {
            Ok(_) => true,
            Err(err) => !is_not_found(&err),
        }
    }

    async fn persistent_volume_delete(&self, _namespace: &str, name: &str) -> Result<()> {
        self.persistent_volumes()
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("could not delete the persistent volume {name}"))?;
        Ok(())
    }

    async fn persistent_volume_claim_create(
        &self,
        namespace: &str,
        name: &str,
        volume_name: &str,
    ) -> Result<()> {
        let mut requests = BTreeMap::new();
        requests.insert(
            "storage".to_string(),
            Quantity(PERSISTENT_VOLUME_SIZE.into()),
        );

        let claim = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![ACCESS_MODE_READ_WRITE_ONCE.into()]),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                volume_name: Some(volume_name.into()),
                storage_class_name: Some(STORAGE_CLASS.into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.claims(namespace)
            .create(&PostParams::default(), &claim)
            .await
            .with_context(|| format!("could not create the persistent volume claim {name}"))?;
        Ok(())
    }

    // Claims are looked up purely by name and namespace; the volume binding
    // only matters at creation time.
    async fn persistent_volume_claim_exists(
        &self,
        namespace: &str,
        name: &str,
        _volume_name: &str,
    ) -> bool {
        match self.claims(namespace).get(name).await {
            Ok(_) => true,
            Err(err) => !is_not_found(&err),
        }
    }

    async fn persistent_volume_claim_delete(
        &self,
        namespace: &str,
        name: &str,
        _volume_name: &str,
    ) -> Result<()> {
        self.claims(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("could not delete the persistent volume claim {name}"))?;
        Ok(())
    }

    async fn secret_get(&self, namespace: &str, name: &str) -> Result<Secret> {
        self.secrets(namespace)
            .get(name)
            .await
            .with_context(|| format!("could not get the secret {name}"))
    }

    async fn secret_create_or_update(&self, secret: Secret) -> Result<()> {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let api = self.secrets(&namespace);

        match api.get(&name).await {
            Ok(_) => {
                debug!(secret = %name, "secret exists, updating");
                api.replace(&name, &PostParams::default(), &secret)
                    .await
                    .with_context(|| format!("could not update the secret {name}"))?;
                Ok(())
            }
            Err(err) if is_not_found(&err) => {
                debug!(secret = %name, "secret not found, creating");
                api.create(&PostParams::default(), &secret)
                    .await
                    .with_context(|| format!("could not create the secret {name}"))?;
                Ok(())
            }
            Err(err) => Err(err)
                .with_context(|| format!("unexpected error while handling the secret {name}")),
        }
    }

    async fn deployment_restart(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        // Same pod-template annotation `kubectl rollout restart` writes.
        let patch = serde_json::json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            "kubectl.kubernetes.io/restartedAt": chrono::Utc::now().to_rfc3339(),
                        }
                    }
                }
            }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("could not restart the deployment {name}"))?;
        Ok(())
    }

    async fn service_get(&self, namespace: &str, name: &str) -> Result<Service> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .with_context(|| format!("could not get the service {name}"))
    }

    async fn server_version(&self) -> Result<String> {
        let info = self
            .client
            .apiserver_version()
            .await
            .context("could not determine the kubernetes server version")?;
        Ok(info.git_version)
    }

    async fn events_watch(&self, namespace: &str) -> Result<EventStream> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let stream = api
            .watch(&WatchParams::default(), "0")
            .await
            .with_context(|| format!("could not watch events in the namespace {namespace}"))?;
        Ok(stream.boxed())
    }

    async fn logs_get(&self, namespace: &str, name: &str) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let reader = api
            .log_stream(name, &LogParams::default())
            .await
            .with_context(|| format!("could not get logs for pod {name}"))?;
        buffer_logs(name, reader).await
    }
}

/// Fully buffer a pod log stream into a string.
///
/// The reader is consumed and dropped on every exit path, which releases the
/// underlying connection whether the copy succeeds or fails.
pub(crate) async fn buffer_logs<R>(name: &str, mut reader: R) -> Result<String>
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .await
        .with_context(|| format!("could not copy logs from pod {name}"))?;
    Ok(buf)
}

/// Read a field from a secret's data as a UTF-8 string. Missing fields read
/// as empty.
#[must_use]
pub fn secret_value(secret: &Secret, key: &str) -> String {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| String::from_utf8_lossy(&value.0).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod k8s_tests;
