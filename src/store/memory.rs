//! # In-memory Store
//!
//! Deterministic `CapabilityStore` double used by the test suite and by local
//! experiments. Mirrors the store semantics the core relies on: atomic
//! name-uniqueness on create, UID assignment, and a generation bump on every
//! spec change.

use crate::crd::{DeploymentPhase, ProvidedCapability, ServerStatus};
use crate::error::CapabilityError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Key = (String, String);

#[derive(Default)]
struct Inner {
    capabilities: BTreeMap<Key, ProvidedCapability>,
    secrets: BTreeMap<Key, Secret>,
    services: BTreeMap<Key, Service>,
    uid_counter: u64,
}

/// Shared, cloneable in-memory store.
#[derive(Clone, Default)]
pub struct InMemoryCapabilityStore {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for InMemoryCapabilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCapabilityStore").finish_non_exhaustive()
    }
}

impl InMemoryCapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a Secret, e.g. an admin credentials secret for USE_EXTERNAL tests.
    pub fn put_secret(&self, secret: Secret) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&secret.metadata.namespace, &secret.metadata.name);
        inner.secrets.insert(key, secret);
    }

    /// Seed a Service, as a deployment controller would create it.
    pub fn put_service(&self, service: Service) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&service.metadata.namespace, &service.metadata.name);
        inner.services.insert(key, service);
    }

    /// Number of capabilities currently stored.
    pub fn capability_count(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").capabilities.len()
    }
}

fn key_of(namespace: &Option<String>, name: &Option<String>) -> Key {
    (
        namespace.clone().unwrap_or_else(|| "default".to_string()),
        name.clone().unwrap_or_default(),
    )
}

fn matches_selector(capability: &ProvidedCapability, selector: &BTreeMap<String, String>) -> bool {
    let Some(labels) = &capability.metadata.labels else {
        return false;
    };
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|found| found == v))
}

#[async_trait]
impl super::CapabilityStore for InMemoryCapabilityStore {
    async fn load_capability(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProvidedCapability>, CapabilityError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .capabilities
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_if_absent(
        &self,
        mut capability: ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&capability.metadata.namespace, &capability.metadata.name);
        if let Some(existing) = inner.capabilities.get(&key) {
            return Ok(existing.clone());
        }
        inner.uid_counter += 1;
        capability.metadata.uid = Some(format!("cap-uid-{:06}", inner.uid_counter));
        capability.metadata.generation = Some(1);
        inner.capabilities.insert(key, capability.clone());
        Ok(capability)
    }

    async fn update_spec(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&capability.metadata.namespace, &capability.metadata.name);
        let Some(existing) = inner.capabilities.get_mut(&key) else {
            return Err(anyhow::anyhow!("capability {}/{} not found", key.0, key.1).into());
        };
        existing.spec = capability.spec.clone();
        existing.metadata.generation = Some(existing.metadata.generation.unwrap_or(1) + 1);
        Ok(existing.clone())
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: ServerStatus,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = (namespace.to_string(), name.to_string());
        let Some(existing) = inner.capabilities.get_mut(&key) else {
            return Err(anyhow::anyhow!("capability {namespace}/{name} not found").into());
        };
        existing
            .status
            .get_or_insert_with(Default::default)
            .put_server_status(status);
        Ok(existing.clone())
    }

    async fn update_phase(
        &self,
        namespace: &str,
        name: &str,
        phase: DeploymentPhase,
        observed_generation: Option<i64>,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = (namespace.to_string(), name.to_string());
        let Some(existing) = inner.capabilities.get_mut(&key) else {
            return Err(anyhow::anyhow!("capability {namespace}/{name} not found").into());
        };
        existing
            .status
            .get_or_insert_with(Default::default)
            .update_phase(phase, observed_generation);
        Ok(existing.clone())
    }

    async fn reload(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<Option<ProvidedCapability>, CapabilityError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&capability.metadata.namespace, &capability.metadata.name);
        Ok(inner.capabilities.get(&key).cloned())
    }

    async fn list_by_labels(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ProvidedCapability>, CapabilityError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .capabilities
            .iter()
            .filter(|((ns, _), capability)| {
                ns == namespace && matches_selector(capability, selector)
            })
            .map(|(_, capability)| capability.clone())
            .collect())
    }

    async fn load_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, CapabilityError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_secret_if_absent(&self, secret: Secret) -> Result<Secret, CapabilityError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = key_of(&secret.metadata.namespace, &secret.metadata.name);
        if let Some(existing) = inner.secrets.get(&key) {
            return Ok(existing.clone());
        }
        inner.secrets.insert(key, secret.clone());
        Ok(secret)
    }

    async fn load_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, CapabilityError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .services
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
