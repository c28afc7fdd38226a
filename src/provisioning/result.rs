//! # Provisioning Results
//!
//! The in-memory projection handed from the provisioning layer to
//! capability-specific connection-info adapters, and mirrored onto the
//! requesting resource's own status.

use crate::constants;
use crate::crd::{ControllerFailure, ProvidedCapability, ServerStatus};
use k8s_openapi::api::core::v1::{Secret, Service};

/// Outcome of one `provide_capability` invocation.
///
/// Failures are carried as data: a conflict, validation error, deployment
/// failure or timeout all produce a result with `controller_failure` set, and
/// the capability/service/secret fields populated as far as resolution got.
#[derive(Debug, Clone)]
pub struct CapabilityProvisioningResult {
    /// The resolved capability, when one was identified before failing.
    pub provided_capability: Option<ProvidedCapability>,
    /// The capability's Service; absent for USE_EXTERNAL capabilities.
    pub service: Option<Service>,
    /// The admin credentials Secret, when the status references one.
    pub admin_secret: Option<Secret>,
    pub controller_failure: Option<ControllerFailure>,
}

impl CapabilityProvisioningResult {
    pub fn succeeded(
        provided_capability: ProvidedCapability,
        service: Option<Service>,
        admin_secret: Option<Secret>,
    ) -> Self {
        Self {
            provided_capability: Some(provided_capability),
            service,
            admin_secret,
            controller_failure: None,
        }
    }

    /// A failure detected before any capability could be identified.
    pub fn failed(failure: ControllerFailure) -> Self {
        Self {
            provided_capability: None,
            service: None,
            admin_secret: None,
            controller_failure: Some(failure),
        }
    }

    /// A failure on an identified capability.
    pub fn failed_on(capability: ProvidedCapability, failure: ControllerFailure) -> Self {
        Self {
            provided_capability: Some(capability),
            service: None,
            admin_secret: None,
            controller_failure: Some(failure),
        }
    }

    pub fn has_failed(&self) -> bool {
        self.controller_failure.is_some()
    }

    /// The "main" status entry written by the deployment controller.
    pub fn main_server_status(&self) -> Option<&ServerStatus> {
        self.provided_capability
            .as_ref()
            .and_then(|c| c.status.as_ref())
            .and_then(|s| s.server_status(constants::MAIN_QUALIFIER))
    }

    /// Project this result as a status entry on the *requesting* resource,
    /// under its own qualifier. Keeping dependency failures on a separate
    /// qualifier is what makes them distinguishable from failures in the
    /// dependent's own deployment.
    pub fn as_dependency_status(&self, qualifier: &str) -> ServerStatus {
        let mut status = self
            .main_server_status()
            .cloned()
            .unwrap_or_else(|| ServerStatus::new(qualifier));
        status.qualifier = qualifier.to_string();
        if let Some(failure) = &self.controller_failure {
            status.failure = Some(failure.clone());
        }
        status
    }
}
