//! # Kubernetes-backed Store
//!
//! `CapabilityStore` implementation over a `kube::Client`.
//!
//! Name uniqueness is enforced by the API server: `create_if_absent` issues a
//! plain create and resolves a 409 AlreadyExists by loading the winner, so
//! concurrent requesters converge on one object. Status writes go through the
//! status subresource with a merge patch, the same shape the deployment
//! controllers use.

use crate::crd::{DeploymentPhase, ProvidedCapability, ProvidedCapabilityStatus, ServerStatus};
use crate::error::CapabilityError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Field manager recorded on writes from this library.
const FIELD_MANAGER: &str = "capability-controller";

#[derive(Clone)]
pub struct KubeCapabilityStore {
    client: Client,
}

impl std::fmt::Debug for KubeCapabilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCapabilityStore").finish_non_exhaustive()
    }
}

impl KubeCapabilityStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn capabilities(&self, namespace: &str) -> Api<ProvidedCapability> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ProvidedCapabilityStatus,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let patch = serde_json::json!({ "status": status });
        let capability = self
            .capabilities(namespace)
            .patch_status(
                name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(capability)
    }

    async fn load_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ProvidedCapabilityStatus, CapabilityError> {
        let capability = self.capabilities(namespace).get(name).await?;
        Ok(capability.status.unwrap_or_default())
    }
}

fn is_already_exists(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}

#[async_trait]
impl super::CapabilityStore for KubeCapabilityStore {
    async fn load_capability(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProvidedCapability>, CapabilityError> {
        Ok(self.capabilities(namespace).get_opt(name).await?)
    }

    async fn create_if_absent(
        &self,
        capability: ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let namespace = capability
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let name = capability.metadata.name.clone().unwrap_or_default();
        match self
            .capabilities(&namespace)
            .create(&PostParams::default(), &capability)
            .await
        {
            Ok(created) => Ok(created),
            Err(error) if is_already_exists(&error) => {
                // Lost the create race; the existing object is authoritative.
                debug!(%namespace, %name, "capability already exists, reusing");
                Ok(self.capabilities(&namespace).get(&name).await?)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn update_spec(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let namespace = capability.metadata.namespace.as_deref().unwrap_or("default");
        let name = capability.metadata.name.as_deref().unwrap_or_default();
        let patch = serde_json::json!({ "spec": capability.spec });
        let updated = self
            .capabilities(namespace)
            .patch(
                name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(updated)
    }

    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: ServerStatus,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut ledger = self.load_status(namespace, name).await?;
        ledger.put_server_status(status);
        self.patch_status(namespace, name, &ledger).await
    }

    async fn update_phase(
        &self,
        namespace: &str,
        name: &str,
        phase: DeploymentPhase,
        observed_generation: Option<i64>,
    ) -> Result<ProvidedCapability, CapabilityError> {
        let mut ledger = self.load_status(namespace, name).await?;
        if !ledger.update_phase(phase, observed_generation) {
            debug!(%namespace, %name, %phase, "ignoring stale phase update");
            return self.capabilities(namespace).get(name).await.map_err(Into::into);
        }
        self.patch_status(namespace, name, &ledger).await
    }

    async fn reload(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<Option<ProvidedCapability>, CapabilityError> {
        let namespace = capability.metadata.namespace.as_deref().unwrap_or("default");
        let name = capability.metadata.name.as_deref().unwrap_or_default();
        self.load_capability(namespace, name).await
    }

    async fn list_by_labels(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ProvidedCapability>, CapabilityError> {
        let label_selector = selector
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        let params = ListParams::default().labels(&label_selector);
        let list = self.capabilities(namespace).list(&params).await?;
        Ok(list.items)
    }

    async fn load_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, CapabilityError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create_secret_if_absent(&self, secret: Secret) -> Result<Secret, CapabilityError> {
        let namespace = secret
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let name = secret.metadata.name.clone().unwrap_or_default();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        match api.create(&PostParams::default(), &secret).await {
            Ok(created) => Ok(created),
            Err(error) if is_already_exists(&error) => Ok(api.get(&name).await?),
            Err(error) => Err(error.into()),
        }
    }

    async fn load_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, CapabilityError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}
