//! # Provisioning State Machine
//!
//! Orchestrates the full lifecycle of a single capability request:
//! resolve-or-create the `ProvidedCapability`, delegate to the out-of-process
//! deployment controller by writing it into the store, block with bounded
//! waits for commencement and completion, and translate the terminal status
//! into a result or a typed failure.
//!
//! States: UNRESOLVED -> CREATED/REUSED -> COMMENCED -> SUCCEEDED | FAILED |
//! TIMED_OUT. Terminal states are final; nothing is retried automatically - a
//! fresh call with a fresh requirement re-enters UNRESOLVED, and deterministic
//! naming makes the retry converge on the same object.

use crate::config::OperatorConfig;
use crate::constants;
use crate::crd::{
    CapabilityRequester, CapabilityRequirement, ControllerFailure, DeploymentPhase,
    ExternallyProvidedService, ProvidedCapability, ProvisioningStrategy, ServerStatus,
};
use crate::error::CapabilityError;
use crate::matcher::{self, CandidateLocation, MatchOutcome};
use crate::provisioning::result::CapabilityProvisioningResult;
use crate::provisioning::wait::await_capability;
use crate::store::CapabilityStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Independent bounds for the two blocking waits.
#[derive(Debug, Clone, Copy)]
pub struct ProvisioningTimeouts {
    /// Wait for a deployment controller to pick the capability up.
    pub commencement: Duration,
    /// Wait for a terminal phase, usually larger than `commencement`.
    pub completion: Duration,
}

impl From<&OperatorConfig> for ProvisioningTimeouts {
    fn from(config: &OperatorConfig) -> Self {
        Self {
            commencement: config.commencement_timeout,
            completion: config.completion_timeout,
        }
    }
}

/// Resolves capability requirements against a resource store.
#[derive(Debug, Clone)]
pub struct CapabilityProvider<S> {
    store: Arc<S>,
    config: OperatorConfig,
}

impl<S: CapabilityStore> CapabilityProvider<S> {
    pub fn new(store: Arc<S>, config: OperatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Resolve `requirement` on behalf of `requester` and drive it to a
    /// terminal outcome.
    ///
    /// Returns `Err` only for store/transport faults. Every domain-level
    /// failure - conflict, validation error, deployment failure, timeout -
    /// comes back as an `Ok` result carrying a `ControllerFailure`.
    pub async fn provide_capability(
        &self,
        requester: &CapabilityRequester,
        requirement: &CapabilityRequirement,
        timeouts: ProvisioningTimeouts,
    ) -> Result<CapabilityProvisioningResult, CapabilityError> {
        if requirement.provisioning_strategy == ProvisioningStrategy::UseExternal {
            if let Some(failure) = self.validate_external(requester, requirement).await? {
                // Fails fast, before any store write a controller could observe.
                return Ok(CapabilityProvisioningResult::failed(failure));
            }
        }

        let capability = match self.resolve_or_create(requester, requirement).await? {
            Ok(capability) => capability,
            Err(failure) => {
                info!(message = %failure.message, "capability requirement rejected");
                return Ok(CapabilityProvisioningResult::failed(failure));
            }
        };

        if requirement.provisioning_strategy == ProvisioningStrategy::UseExternal {
            return self.bind_external(requester, requirement, capability).await;
        }

        self.await_deployment(capability, timeouts).await
    }

    /// Run the matcher against the store and persist its outcome.
    async fn resolve_or_create(
        &self,
        requester: &CapabilityRequester,
        requirement: &CapabilityRequirement,
    ) -> Result<Result<ProvidedCapability, ControllerFailure>, CapabilityError> {
        let location = match matcher::candidate_location(requirement, requester, &self.config) {
            Ok(location) => location,
            Err(failure) => return Ok(Err(failure)),
        };
        let candidates = match &location {
            CandidateLocation::Name { namespace, name } => self
                .store
                .load_capability(namespace, name)
                .await?
                .into_iter()
                .collect(),
            CandidateLocation::Selector {
                namespace,
                selector,
            } => self.store.list_by_labels(namespace, selector).await?,
        };

        match matcher::match_capability(requirement, requester, &candidates, &self.config) {
            MatchOutcome::Conflict(failure) => Ok(Err(failure)),
            MatchOutcome::CreateNew(planned) => {
                info!(
                    name = planned.metadata.name.as_deref().unwrap_or_default(),
                    namespace = planned.metadata.namespace.as_deref().unwrap_or_default(),
                    "creating capability"
                );
                Ok(Ok(self.store.create_if_absent(*planned).await?))
            }
            MatchOutcome::ReuseExisting {
                capability,
                spec_changed,
            } => {
                if spec_changed {
                    if !capability.is_owned_by(requester) {
                        debug!(
                            name = capability.metadata.name.as_deref().unwrap_or_default(),
                            "merging non-essential fields into a capability owned by another resource"
                        );
                    }
                    Ok(Ok(self.store.update_spec(&capability).await?))
                } else {
                    Ok(Ok(*capability))
                }
            }
        }
    }

    /// Block for commencement, then completion, then translate the terminal
    /// status.
    async fn await_deployment(
        &self,
        capability: ProvidedCapability,
        timeouts: ProvisioningTimeouts,
    ) -> Result<CapabilityProvisioningResult, CapabilityError> {
        let namespace = capability
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let name = capability.metadata.name.clone().unwrap_or_default();
        let generation = capability.metadata.generation;

        // Commencement: any status write counts as "a controller picked this
        // up", letting the requester distinguish an idle cluster from a slow
        // deployment.
        let commenced = await_capability(
            self.store.as_ref(),
            &namespace,
            &name,
            |c| c.status.is_some(),
            timeouts.commencement,
            self.config.poll_interval,
        )
        .await?;
        if commenced.is_none() {
            let failure = ControllerFailure::for_object(
                "ProvidedCapability",
                &name,
                format!(
                    "The ProvidedCapability '{name}' was not picked up by a capability deployment controller within {} seconds",
                    timeouts.commencement.as_secs()
                ),
                "timed out waiting for deployment commencement",
            );
            return self
                .record_failure(&namespace, &name, generation, failure)
                .await;
        }

        let completed = await_capability(
            self.store.as_ref(),
            &namespace,
            &name,
            |c| {
                c.status
                    .as_ref()
                    .is_some_and(|status| status.phase.is_terminal())
            },
            timeouts.completion,
            self.config.poll_interval,
        )
        .await?;
        let Some(capability) = completed else {
            let failure = ControllerFailure::for_object(
                "ProvidedCapability",
                &name,
                format!(
                    "The deployment of the ProvidedCapability '{name}' did not complete within {} seconds",
                    timeouts.completion.as_secs()
                ),
                "timed out waiting for deployment completion",
            );
            return self
                .record_failure(&namespace, &name, generation, failure)
                .await;
        };

        let status = capability.status.clone().unwrap_or_default();
        if status.phase == DeploymentPhase::Failed || status.has_failed() {
            let failure = status
                .find_failed_server_status()
                .and_then(|s| s.failure.clone())
                .unwrap_or_else(|| {
                    ControllerFailure::for_object(
                        "ProvidedCapability",
                        &name,
                        format!("The deployment of the ProvidedCapability '{name}' failed"),
                        "deployment controller reported failure without detail",
                    )
                });
            return Ok(CapabilityProvisioningResult::failed_on(capability, failure));
        }

        // SUCCESSFUL: collect the associated Service and admin Secret.
        let main_status = status.server_status(constants::MAIN_QUALIFIER);
        let service_name = main_status
            .and_then(|s| s.service_name.clone())
            .unwrap_or_else(|| crate::naming::service_name(&name));
        let service = self.store.load_service(&namespace, &service_name).await?;
        if service.is_none() {
            warn!(%namespace, %service_name, "successful capability has no service");
        }
        let admin_secret = match main_status.and_then(|s| s.admin_secret_name.clone()) {
            Some(secret_name) => self.store.load_secret(&namespace, &secret_name).await?,
            None => None,
        };
        Ok(CapabilityProvisioningResult::succeeded(
            capability,
            service,
            admin_secret,
        ))
    }

    /// Persist a synthesized failure onto the capability and fold it into the
    /// result. The capability itself is left in place so a retry converges on
    /// it instead of duplicating work.
    async fn record_failure(
        &self,
        namespace: &str,
        name: &str,
        generation: Option<i64>,
        failure: ControllerFailure,
    ) -> Result<CapabilityProvisioningResult, CapabilityError> {
        warn!(%namespace, %name, message = %failure.message, "capability provisioning failed");
        self.store
            .update_status(
                namespace,
                name,
                ServerStatus::with_failure(constants::MAIN_QUALIFIER, failure.clone()),
            )
            .await?;
        let capability = self
            .store
            .update_phase(namespace, name, DeploymentPhase::Failed, generation)
            .await?;
        Ok(CapabilityProvisioningResult::failed_on(capability, failure))
    }

    /// Synchronous validation for USE_EXTERNAL requirements. Returns a
    /// failure instead of delegating anything to a deployment controller.
    async fn validate_external(
        &self,
        requester: &CapabilityRequester,
        requirement: &CapabilityRequirement,
    ) -> Result<Option<ControllerFailure>, CapabilityError> {
        let noun = requirement.capability.external_service_noun();
        let descriptor = requirement.externally_provided_service.clone().unwrap_or_default();
        if descriptor.host.as_deref().is_none_or(str::is_empty) {
            return Ok(Some(ControllerFailure::new(format!(
                "Please provide the hostname of the {noun} service you intend to connect to"
            ))));
        }
        let Some(secret_name) = descriptor
            .admin_secret_name
            .as_deref()
            .filter(|s| !s.is_empty())
        else {
            return Ok(Some(ControllerFailure::new(format!(
                "Please provide the name of the secret containing the admin credentials for the {noun} service you intend to connect to"
            ))));
        };
        if self
            .store
            .load_secret(&requester.namespace, secret_name)
            .await?
            .is_none()
        {
            return Ok(Some(ControllerFailure::new(format!(
                "Please ensure that a secret with the name '{secret_name}' exists in the requested namespace"
            ))));
        }
        Ok(None)
    }

    /// USE_EXTERNAL skips delegation: the state machine itself records the
    /// external endpoint on the capability status and marks it successful,
    /// with no blocking wait.
    async fn bind_external(
        &self,
        requester: &CapabilityRequester,
        requirement: &CapabilityRequirement,
        capability: ProvidedCapability,
    ) -> Result<CapabilityProvisioningResult, CapabilityError> {
        let namespace = capability
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let name = capability.metadata.name.clone().unwrap_or_default();
        let descriptor = requirement
            .externally_provided_service
            .clone()
            .unwrap_or_default();

        let mut status = ServerStatus::new(constants::MAIN_QUALIFIER);
        let base_url = external_base_url(&descriptor);
        status.external_base_url = Some(base_url.clone());
        status.internal_base_url = Some(base_url);
        status.admin_secret_name = descriptor.admin_secret_name.clone();
        self.store.update_status(&namespace, &name, status).await?;
        let capability = self
            .store
            .update_phase(
                &namespace,
                &name,
                DeploymentPhase::Successful,
                capability.metadata.generation,
            )
            .await?;

        // Admin secret was validated against the requester's namespace.
        let admin_secret = match descriptor.admin_secret_name.as_deref() {
            Some(secret_name) => {
                self.store
                    .load_secret(&requester.namespace, secret_name)
                    .await?
            }
            None => None,
        };
        info!(%namespace, %name, "bound capability to externally provided service");
        Ok(CapabilityProvisioningResult::succeeded(
            capability,
            None,
            admin_secret,
        ))
    }
}

fn external_base_url(descriptor: &ExternallyProvidedService) -> String {
    let host = descriptor.host.as_deref().unwrap_or_default();
    let path = descriptor.path.as_deref().unwrap_or("");
    match descriptor.port {
        Some(port) => format!("https://{host}:{port}{path}"),
        None => format!("https://{host}{path}"),
    }
}
