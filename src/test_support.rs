// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes for the capability seams.
//!
//! [`FakeClient`] implements [`crate::k8s::Client`] against plain maps and
//! records call counts so flows can be exercised without a cluster. The
//! other fakes cover the runtime probe, the remote Airbyte API, telemetry,
//! and the progress reporter.

use crate::airbyte::OrgApi;
use crate::docker::{RuntimeProbe, Version};
use crate::k8s::{Client, EventStream};
use crate::reporter::Reporter;
use crate::telemetry::{self, EventType};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a secret with string data, the way the installer seeds it.
pub fn make_secret(namespace: &str, name: &str, fields: &[(&str, &str)]) -> Secret {
    let data: BTreeMap<String, ByteString> = fields
        .iter()
        .map(|(key, value)| ((*key).to_string(), ByteString(value.as_bytes().to_vec())))
        .collect();
    Secret {
        metadata: ObjectMeta {
            namespace: Some(namespace.into()),
            name: Some(name.into()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

/// In-memory [`Client`] with call counting.
#[derive(Default)]
pub struct FakeClient {
    pub namespaces: Mutex<BTreeSet<String>>,
    pub volumes: Mutex<BTreeSet<String>>,
    /// claim name -> bound volume name
    pub claims: Mutex<BTreeMap<(String, String), String>>,
    pub ingresses: Mutex<BTreeMap<(String, String), Ingress>>,
    pub secrets: Mutex<BTreeMap<(String, String), Secret>>,
    /// When non-empty, `secret_get` serves these in order instead of the
    /// store, letting tests script what each re-read observes.
    pub scripted_gets: Mutex<VecDeque<Secret>>,
    pub services: Mutex<BTreeMap<(String, String), Service>>,
    pub logs: Mutex<BTreeMap<(String, String), String>>,
    pub version: String,

    pub secret_gets: AtomicUsize,
    pub secret_writes: AtomicUsize,
    pub restarts: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            version: "v1.31.0".into(),
            ..Default::default()
        }
    }

    pub fn with_secret(self, secret: Secret) -> Self {
        let key = (
            secret.metadata.namespace.clone().unwrap_or_default(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(key, secret);
        self
    }

    pub fn with_service(self, namespace: &str, name: &str) -> Self {
        let service = Service {
            metadata: ObjectMeta {
                namespace: Some(namespace.into()),
                name: Some(name.into()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.services
            .lock()
            .unwrap()
            .insert((namespace.into(), name.into()), service);
        self
    }

    pub fn stored_secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.into(), name.into()))
            .cloned()
    }
}

#[async_trait]
impl Client for FakeClient {
    async fn ingress_create(&self, namespace: &str, ingress: Ingress) -> Result<()> {
        let name = ingress.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        let mut ingresses = self.ingresses.lock().unwrap();
        if ingresses.contains_key(&key) {
            bail!("ingress {name} already exists");
        }
        ingresses.insert(key, ingress);
        Ok(())
    }

    async fn ingress_exists(&self, namespace: &str, name: &str) -> bool {
        self.ingresses
            .lock()
            .unwrap()
            .contains_key(&(namespace.into(), name.into()))
    }

    async fn ingress_update(&self, namespace: &str, ingress: Ingress) -> Result<()> {
        let name = ingress.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        let mut ingresses = self.ingresses.lock().unwrap();
        if !ingresses.contains_key(&key) {
            bail!("ingress {name} not found");
        }
        ingresses.insert(key, ingress);
        Ok(())
    }

    async fn namespace_create(&self, name: &str) -> Result<()> {
        if !self.namespaces.lock().unwrap().insert(name.to_string()) {
            bail!("namespace {name} already exists");
        }
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> bool {
        self.namespaces.lock().unwrap().contains(name)
    }

    async fn namespace_delete(&self, name: &str) -> Result<()> {
        if !self.namespaces.lock().unwrap().remove(name) {
            bail!("namespace {name} not found");
        }
        Ok(())
    }

    async fn persistent_volume_create(&self, _namespace: &str, name: &str) -> Result<()> {
        if !self.volumes.lock().unwrap().insert(name.to_string()) {
            bail!("persistent volume {name} already exists");
        }
        Ok(())
    }

    async fn persistent_volume_exists(&self, _namespace: &str, name: &str) -> bool {
        self.volumes.lock().unwrap().contains(name)
    }

    async fn persistent_volume_delete(&self, _namespace: &str, name: &str) -> Result<()> {
        if !self.volumes.lock().unwrap().remove(name) {
            bail!("persistent volume {name} not found");
        }
        Ok(())
    }

    async fn persistent_volume_claim_create(
        &self,
        namespace: &str,
        name: &str,
        volume_name: &str,
    ) -> Result<()> {
        let key = (namespace.to_string(), name.to_string());
        let mut claims = self.claims.lock().unwrap();
        if claims.contains_key(&key) {
            bail!("persistent volume claim {name} already exists");
        }
        claims.insert(key, volume_name.to_string());
        Ok(())
    }

    async fn persistent_volume_claim_exists(
        &self,
        namespace: &str,
        name: &str,
        _volume_name: &str,
    ) -> bool {
        self.claims
            .lock()
            .unwrap()
            .contains_key(&(namespace.into(), name.into()))
    }

    async fn persistent_volume_claim_delete(
        &self,
        namespace: &str,
        name: &str,
        _volume_name: &str,
    ) -> Result<()> {
        if self
            .claims
            .lock()
            .unwrap()
            .remove(&(namespace.into(), name.into()))
            .is_none()
        {
            bail!("persistent volume claim {name} not found");
        }
        Ok(())
    }

    async fn secret_get(&self, namespace: &str, name: &str) -> Result<Secret> {
        self.secret_gets.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.scripted_gets.lock().unwrap().pop_front() {
            return Ok(scripted);
        }
        self.stored_secret(namespace, name)
            .ok_or_else(|| anyhow!("could not get the secret {name}"))
    }

    async fn secret_create_or_update(&self, secret: Secret) -> Result<()> {
        self.secret_writes.fetch_add(1, Ordering::SeqCst);
        let key = (
            secret.metadata.namespace.clone().unwrap_or_default(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(key, secret);
        Ok(())
    }

    async fn deployment_restart(&self, _namespace: &str, _name: &str) -> Result<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn service_get(&self, namespace: &str, name: &str) -> Result<Service> {
        self.services
            .lock()
            .unwrap()
            .get(&(namespace.into(), name.into()))
            .cloned()
            .ok_or_else(|| anyhow!("could not get the service {name}"))
    }

    async fn server_version(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    async fn events_watch(&self, _namespace: &str) -> Result<EventStream> {
        Ok(futures::stream::empty().boxed())
    }

    async fn logs_get(&self, namespace: &str, name: &str) -> Result<String> {
        self.logs
            .lock()
            .unwrap()
            .get(&(namespace.into(), name.into()))
            .cloned()
            .ok_or_else(|| anyhow!("could not get logs for pod {name}"))
    }
}

/// Configurable runtime probe double.
pub struct FakeProbe {
    pub version: Option<Version>,
    pub containers: BTreeSet<String>,
    pub fail_containers: bool,
    pub port: Option<u16>,
    pub version_calls: AtomicUsize,
    pub container_calls: AtomicUsize,
}

impl FakeProbe {
    pub fn healthy() -> Self {
        Self {
            version: Some(Version {
                version: "27.0.1".into(),
                arch: "amd64".into(),
                platform: "Docker Engine - Community".into(),
            }),
            containers: BTreeSet::new(),
            fail_containers: false,
            port: Some(8000),
            version_calls: AtomicUsize::new(0),
            container_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            version: None,
            fail_containers: true,
            port: None,
            ..Self::healthy()
        }
    }

    pub fn with_container(mut self, name: &str) -> Self {
        self.containers.insert(name.to_string());
        self
    }

    /// Version probing works but container inspection fails.
    pub fn failing_containers(mut self) -> Self {
        self.fail_containers = true;
        self
    }
}

#[async_trait]
impl RuntimeProbe for FakeProbe {
    async fn version(&self) -> Result<Version> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.version
            .clone()
            .ok_or_else(|| anyhow!("Cannot connect to the Docker daemon"))
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_containers {
            bail!("Cannot connect to the Docker daemon");
        }
        Ok(self.containers.contains(name))
    }

    async fn mapped_port(&self, name: &str, _internal_port: u16) -> Result<u16> {
        self.port
            .ok_or_else(|| anyhow!("could not determine the published port of {name}"))
    }
}

/// Remote API double with shared interior so tests can assert after the flow
/// consumed a clone.
#[derive(Clone, Default)]
pub struct FakeOrgApi {
    inner: Arc<FakeOrgApiInner>,
}

#[derive(Default)]
struct FakeOrgApiInner {
    email: Mutex<String>,
    set_calls: Mutex<Vec<String>>,
    get_calls: AtomicUsize,
    credentials: Mutex<Option<(String, String)>>,
}

impl FakeOrgApi {
    pub fn with_email(email: &str) -> Self {
        let api = Self::default();
        *api.inner.email.lock().unwrap() = email.to_string();
        api
    }

    /// Record the credentials the flow constructed the API with.
    pub fn record_credentials(&self, client_id: &str, client_secret: &str) {
        *self.inner.credentials.lock().unwrap() =
            Some((client_id.to_string(), client_secret.to_string()));
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        self.inner.credentials.lock().unwrap().clone()
    }

    pub fn set_calls(&self) -> Vec<String> {
        self.inner.set_calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> usize {
        self.inner.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrgApi for FakeOrgApi {
    async fn get_org_email(&self) -> Result<String> {
        self.inner.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.email.lock().unwrap().clone())
    }

    async fn set_org_email(&self, email: &str) -> Result<()> {
        self.inner.set_calls.lock().unwrap().push(email.to_string());
        *self.inner.email.lock().unwrap() = email.to_string();
        Ok(())
    }
}

/// Telemetry double recording the envelope.
#[derive(Default)]
pub struct RecordingTelemetry {
    starts: Mutex<Vec<EventType>>,
    successes: Mutex<Vec<EventType>>,
    failures: Mutex<Vec<EventType>>,
    attrs: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingTelemetry {
    /// A telemetry client whose transport always errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn starts(&self) -> Vec<EventType> {
        self.starts.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<EventType> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<EventType> {
        self.failures.lock().unwrap().clone()
    }

    pub fn attrs(&self) -> Vec<(String, String)> {
        self.attrs.lock().unwrap().clone()
    }
}

#[async_trait]
impl telemetry::Client for RecordingTelemetry {
    async fn start(&self, event: EventType) -> Result<()> {
        self.starts.lock().unwrap().push(event);
        if self.fail {
            bail!("telemetry transport down");
        }
        Ok(())
    }

    async fn success(&self, event: EventType) -> Result<()> {
        self.successes.lock().unwrap().push(event);
        if self.fail {
            bail!("telemetry transport down");
        }
        Ok(())
    }

    async fn failure(&self, event: EventType, _error: &anyhow::Error) -> Result<()> {
        self.failures.lock().unwrap().push(event);
        if self.fail {
            bail!("telemetry transport down");
        }
        Ok(())
    }

    fn attr(&self, key: &str, value: &str) {
        self.attrs
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
    }
}

/// Reporter double capturing every message in order.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn phase(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
