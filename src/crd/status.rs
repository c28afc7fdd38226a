//! # Status and Phase Tracking
//!
//! The per-resource, per-qualifier status ledger shared between requesting
//! controllers and capability deployment controllers.
//!
//! The overall deployment phase is a pure function of the qualifier statuses:
//! any failed qualifier makes the resource FAILED, a complete and clean set of
//! required qualifiers makes it SUCCESSFUL, anything in between is
//! REQUESTED/STARTED. Generation numbers guard against applying a stale phase
//! after a newer generation has been observed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse-grained lifecycle state of a resource's provisioning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    #[default]
    Requested,
    Started,
    Successful,
    Failed,
}

impl DeploymentPhase {
    /// Terminal phases are final; the state machine stops waiting on them.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentPhase::Successful | DeploymentPhase::Failed)
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentPhase::Requested => write!(f, "requested"),
            DeploymentPhase::Started => write!(f, "started"),
            DeploymentPhase::Successful => write!(f, "successful"),
            DeploymentPhase::Failed => write!(f, "failed"),
        }
    }
}

/// A recorded failure, carrying both a human-readable message and a
/// machine-usable detail message (typically the original cause's string form).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerFailure {
    /// Kind of the object whose deployment failed
    #[serde(default)]
    pub failed_object_kind: Option<String>,
    /// Name of the object whose deployment failed
    #[serde(default)]
    pub failed_object_name: Option<String>,
    pub message: String,
    #[serde(default)]
    pub detail_message: Option<String>,
}

impl ControllerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            failed_object_kind: None,
            failed_object_name: None,
            message: message.into(),
            detail_message: None,
        }
    }

    pub fn for_object(
        kind: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
        detail_message: impl Into<String>,
    ) -> Self {
        Self {
            failed_object_kind: Some(kind.into()),
            failed_object_name: Some(name.into()),
            message: message.into(),
            detail_message: Some(detail_message.into()),
        }
    }
}

/// One named status entry inside a resource's status.
///
/// Qualifiers distinguish the resource's own deployment ("main") from the
/// deployments of its dependencies ("db", ...), so a failure on a dependency
/// capability stays distinguishable from a failure in the dependent's own
/// rollout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub qualifier: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub ingress_name: Option<String>,
    #[serde(default)]
    pub admin_secret_name: Option<String>,
    /// Externally reachable base URL for exposed services
    #[serde(default)]
    pub external_base_url: Option<String>,
    /// Cluster-internal base URL
    #[serde(default)]
    pub internal_base_url: Option<String>,
    /// Arbitrary parameters derived during deployment
    #[serde(default)]
    pub derived_deployment_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub sso_client_id: Option<String>,
    #[serde(default)]
    pub sso_realm: Option<String>,
    #[serde(default)]
    pub failure: Option<ControllerFailure>,
    /// RFC3339 timestamp of the last write to this entry
    #[serde(default)]
    pub last_update_time: Option<String>,
}

impl ServerStatus {
    pub fn new(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            last_update_time: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }

    pub fn with_failure(qualifier: impl Into<String>, failure: ControllerFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(qualifier)
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Status ledger of a `ProvidedCapability`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedCapabilityStatus {
    #[serde(default)]
    pub phase: DeploymentPhase,
    /// Generation of the spec this status was computed against
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub server_statuses: Vec<ServerStatus>,
}

impl ProvidedCapabilityStatus {
    /// Insert or replace the entry for `status.qualifier`.
    pub fn put_server_status(&mut self, status: ServerStatus) {
        if let Some(existing) = self
            .server_statuses
            .iter_mut()
            .find(|s| s.qualifier == status.qualifier)
        {
            *existing = status;
        } else {
            self.server_statuses.push(status);
        }
    }

    pub fn server_status(&self, qualifier: &str) -> Option<&ServerStatus> {
        self.server_statuses.iter().find(|s| s.qualifier == qualifier)
    }

    pub fn find_failed_server_status(&self) -> Option<&ServerStatus> {
        self.server_statuses.iter().find(|s| s.has_failed())
    }

    pub fn has_failed(&self) -> bool {
        self.phase == DeploymentPhase::Failed || self.find_failed_server_status().is_some()
    }

    /// Apply a phase transition observed at `generation`.
    ///
    /// A stale update (lower generation than already observed) is ignored, so
    /// late status writes from a superseded deployment attempt cannot regress
    /// the ledger. Not a full compare-and-swap; the store's optimistic
    /// concurrency covers the write itself.
    pub fn update_phase(&mut self, phase: DeploymentPhase, generation: Option<i64>) -> bool {
        if let (Some(observed), Some(incoming)) = (self.observed_generation, generation) {
            if incoming < observed {
                return false;
            }
        }
        self.phase = phase;
        if generation.is_some() {
            self.observed_generation = generation;
        }
        true
    }

    /// Phase as a pure function of the qualifier statuses.
    ///
    /// `required_qualifiers` is the set a deployment controller is expected to
    /// write before the resource can be considered complete.
    pub fn derive_phase(&self, required_qualifiers: &[&str]) -> DeploymentPhase {
        if self.find_failed_server_status().is_some() {
            return DeploymentPhase::Failed;
        }
        let all_present = required_qualifiers
            .iter()
            .all(|q| self.server_status(q).is_some());
        if all_present && !required_qualifiers.is_empty() {
            DeploymentPhase::Successful
        } else if self.server_statuses.is_empty() {
            DeploymentPhase::Requested
        } else {
            DeploymentPhase::Started
        }
    }
}
