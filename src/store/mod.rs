//! # Cluster Resource Store
//!
//! The seam between the capability core and the Kubernetes API.
//!
//! Correctness of concurrent resolution relies entirely on this layer:
//! `create_if_absent` must be atomic on name uniqueness (a conditional create
//! at the API server, a single locked map in the in-memory double), so two
//! requesters racing to the same computed name always observe one object.

mod kube_store;
mod memory;

pub use kube_store::KubeCapabilityStore;
pub use memory::InMemoryCapabilityStore;

use crate::crd::{DeploymentPhase, ProvidedCapability, ServerStatus};
use crate::error::CapabilityError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use std::collections::BTreeMap;

/// Typed CRUD against the cluster resource store, restricted to the
/// operations the capability core consumes.
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Load a capability by namespace and name.
    async fn load_capability(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProvidedCapability>, CapabilityError>;

    /// Create the capability unless one already exists under its name, in
    /// which case the existing object is returned. This is the upsert-if-absent
    /// operation that collapses create-create races.
    async fn create_if_absent(
        &self,
        capability: ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError>;

    /// Write back a spec mutation (non-essential-field merges only).
    async fn update_spec(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<ProvidedCapability, CapabilityError>;

    /// Put a server status entry onto the capability's status ledger.
    async fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: ServerStatus,
    ) -> Result<ProvidedCapability, CapabilityError>;

    /// Apply a phase transition, guarded by the observed generation.
    async fn update_phase(
        &self,
        namespace: &str,
        name: &str,
        phase: DeploymentPhase,
        observed_generation: Option<i64>,
    ) -> Result<ProvidedCapability, CapabilityError>;

    /// Re-read a capability from the store.
    async fn reload(
        &self,
        capability: &ProvidedCapability,
    ) -> Result<Option<ProvidedCapability>, CapabilityError>;

    /// List capabilities in a namespace matching every label in `selector`.
    async fn list_by_labels(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ProvidedCapability>, CapabilityError>;

    async fn load_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, CapabilityError>;

    async fn create_secret_if_absent(&self, secret: Secret) -> Result<Secret, CapabilityError>;

    async fn load_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, CapabilityError>;
}
