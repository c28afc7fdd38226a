//! # ProvidedCapability Resource
//!
//! The persisted resource representing one concretely resolved instance of a
//! shared capability (a database server, an SSO server) plus the vocabulary
//! enums shared between requirements and capabilities.
//!
//! Identity invariant: within a given scope, at most one `ProvidedCapability`
//! exists for a given (kind, implementation, scope-determined name). Names are
//! deterministic, never random, so equivalent requests converge on the same
//! object.

use crate::constants;
use crate::crd::status::ProvidedCapabilityStatus;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The abstract kind of infrastructure service being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapabilityKind {
    /// A database management system
    Dbms,
    /// A single-sign-on / identity server
    Sso,
}

impl CapabilityKind {
    /// The implementation chosen when a requirement does not specify one.
    pub fn default_implementation(self) -> CapabilityImplementation {
        match self {
            CapabilityKind::Dbms => CapabilityImplementation::Mysql,
            CapabilityKind::Sso => CapabilityImplementation::Keycloak,
        }
    }

    /// Suffix used for DEDICATED-scope capability names, e.g. `my-app-db`.
    pub fn dedicated_suffix(self) -> &'static str {
        match self {
            CapabilityKind::Dbms => "db",
            CapabilityKind::Sso => "sso",
        }
    }

    /// Lowercase fragment used in deterministic resource names.
    pub fn name_fragment(self) -> &'static str {
        match self {
            CapabilityKind::Dbms => "dbms",
            CapabilityKind::Sso => "sso",
        }
    }

    /// Human-facing noun for USE_EXTERNAL validation messages.
    pub fn external_service_noun(self) -> &'static str {
        match self {
            CapabilityKind::Dbms => "database",
            CapabilityKind::Sso => "SSO",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityKind::Dbms => write!(f, "DBMS"),
            CapabilityKind::Sso => write!(f, "SSO"),
        }
    }
}

/// A concrete implementation of a capability kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapabilityImplementation {
    Mysql,
    Postgresql,
    Oracle,
    Keycloak,
    RedhatSso,
}

impl CapabilityImplementation {
    /// The capability kind this implementation provides.
    pub fn kind(self) -> CapabilityKind {
        match self {
            CapabilityImplementation::Mysql
            | CapabilityImplementation::Postgresql
            | CapabilityImplementation::Oracle => CapabilityKind::Dbms,
            CapabilityImplementation::Keycloak | CapabilityImplementation::RedhatSso => {
                CapabilityKind::Sso
            }
        }
    }

    /// Lowercase fragment used in deterministic resource names.
    pub fn name_fragment(self) -> &'static str {
        match self {
            CapabilityImplementation::Mysql => "mysql",
            CapabilityImplementation::Postgresql => "postgresql",
            CapabilityImplementation::Oracle => "oracle",
            CapabilityImplementation::Keycloak => "keycloak",
            CapabilityImplementation::RedhatSso => "redhat-sso",
        }
    }

    /// Default server port for DBMS vendors. SSO implementations expose HTTP
    /// and take their port from the server status instead.
    pub fn default_port(self) -> Option<i32> {
        match self {
            CapabilityImplementation::Mysql => Some(3306),
            CapabilityImplementation::Postgresql => Some(5432),
            CapabilityImplementation::Oracle => Some(1521),
            CapabilityImplementation::Keycloak | CapabilityImplementation::RedhatSso => None,
        }
    }
}

impl fmt::Display for CapabilityImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityImplementation::Mysql => write!(f, "MYSQL"),
            CapabilityImplementation::Postgresql => write!(f, "POSTGRESQL"),
            CapabilityImplementation::Oracle => write!(f, "ORACLE"),
            CapabilityImplementation::Keycloak => write!(f, "KEYCLOAK"),
            CapabilityImplementation::RedhatSso => write!(f, "REDHAT_SSO"),
        }
    }
}

/// The sharing granularity at which a capability is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapabilityScope {
    /// One shared instance for the whole cluster
    Cluster,
    /// One shared instance per namespace
    Namespace,
    /// A private instance for a single requesting resource
    Dedicated,
    /// Resolved by label selector rather than by name
    Labeled,
    /// Explicitly named by the requirement
    Specified,
}

impl CapabilityScope {
    /// Lowercase fragment used in deterministic resource names.
    pub fn name_fragment(self) -> &'static str {
        match self {
            CapabilityScope::Cluster => "cluster",
            CapabilityScope::Namespace => "namespace",
            CapabilityScope::Dedicated => "dedicated",
            CapabilityScope::Labeled => "labeled",
            CapabilityScope::Specified => "specified",
        }
    }
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityScope::Cluster => write!(f, "CLUSTER"),
            CapabilityScope::Namespace => write!(f, "NAMESPACE"),
            CapabilityScope::Dedicated => write!(f, "DEDICATED"),
            CapabilityScope::Labeled => write!(f, "LABELED"),
            CapabilityScope::Specified => write!(f, "SPECIFIED"),
        }
    }
}

/// Whether a capability is deployed fresh in-cluster or bound to a
/// pre-existing external service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStrategy {
    #[default]
    DeployDirectly,
    UseExternal,
}

/// A reference to a named resource, optionally qualified by namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceReference {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

/// Descriptor of a pre-existing service outside the cluster, used with the
/// USE_EXTERNAL provisioning strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternallyProvidedService {
    /// Hostname of the external service
    #[serde(default)]
    pub host: Option<String>,
    /// Port the external service listens on
    #[serde(default)]
    pub port: Option<i32>,
    /// Context path of the external service, e.g. `/auth`
    #[serde(default)]
    pub path: Option<String>,
    /// Name of the in-namespace Secret holding admin credentials
    #[serde(default)]
    pub admin_secret_name: Option<String>,
}

/// The persisted, reusable instance of a capability.
///
/// Created on the first unmet request for a given scope/name. Subsequent
/// requests may only apply non-essential-structure-preserving updates
/// (preferred hostname, TLS secret); implementation or scope changes against
/// an already resolved capability are reported as conflicts.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "capabilities.platform.io",
    version = "v1",
    kind = "ProvidedCapability",
    namespaced,
    status = "ProvidedCapabilityStatus",
    shortname = "pcap",
    printcolumn = r#"{"name":"Capability", "type":"string", "jsonPath":".spec.capability"}, {"name":"Implementation", "type":"string", "jsonPath":".spec.implementation"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedCapabilitySpec {
    /// The abstract capability kind this resource provides
    pub capability: CapabilityKind,
    /// The concrete implementation backing it
    #[serde(default)]
    pub implementation: Option<CapabilityImplementation>,
    /// The resolution scope this capability was created at
    pub scope: CapabilityScope,
    #[serde(default)]
    pub provisioning_strategy: ProvisioningStrategy,
    /// Back-reference kept when the capability was resolved at SPECIFIED scope
    #[serde(default)]
    pub specified_capability: Option<ResourceReference>,
    /// Labels by which LABELED-scope requirements resolve this capability
    #[serde(default)]
    pub selector: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub preferred_hostname: Option<String>,
    #[serde(default)]
    pub preferred_tls_secret_name: Option<String>,
    /// Opaque, capability-specific parameters (vendor options, JDBC settings, ...)
    #[serde(default)]
    pub capability_parameters: BTreeMap<String, String>,
    /// Present only for USE_EXTERNAL capabilities
    #[serde(default)]
    pub externally_provided_service: Option<ExternallyProvidedService>,
}

impl ProvidedCapability {
    /// The implementation in effect, falling back to the kind's default.
    pub fn implementation_or_default(&self) -> CapabilityImplementation {
        self.spec
            .implementation
            .unwrap_or_else(|| self.spec.capability.default_implementation())
    }

    /// Whether this capability records `requester` as its owner, either via a
    /// native owner reference or via the owner labels/annotation used for
    /// cross-namespace ownership.
    pub fn is_owned_by(&self, requester: &CapabilityRequester) -> bool {
        if let Some(refs) = &self.metadata.owner_references {
            if refs.iter().any(|r| r.uid == requester.uid) {
                return true;
            }
        }
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(constants::OWNER_UID_ANNOTATION))
            .is_some_and(|uid| uid == &requester.uid)
    }
}

/// Identity of the resource on whose behalf a capability is being resolved.
///
/// The ownership edge (owner UID + kind + name) is recorded as data on the
/// created capability and checked by convention at write time; requesters in
/// another namespace cannot use native owner references, so the edge falls
/// back to labels plus a UID annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRequester {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

impl CapabilityRequester {
    pub fn new(kind: &str, namespace: &str, name: &str, uid: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            uid: uid.to_string(),
        }
    }

    /// Native owner reference, valid only for same-namespace ownership.
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: "capabilities.platform.io/v1".to_string(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: None,
        }
    }
}
