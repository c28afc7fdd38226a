//! # Capability Matcher
//!
//! Given a requirement and the `ProvidedCapability` candidates reachable at
//! the applicable scope, decides whether to reuse an existing capability,
//! create a new one, or fail with a conflict.
//!
//! The matcher is a pure function over pre-fetched candidates; the
//! provisioning state machine performs the store lookups. Matching is by
//! identity (resource UID) once created - the store's name-uniqueness
//! guarantee, not the matcher, is what prevents create-create races from
//! duplicating a capability.

use crate::config::OperatorConfig;
use crate::constants;
use crate::crd::{
    CapabilityRequester, CapabilityRequirement, CapabilityScope, ControllerFailure,
    ProvidedCapability, ProvidedCapabilitySpec,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

/// Exact message for a LABELED requirement without a selector.
pub const MISSING_SELECTOR_MESSAGE: &str =
    "A requirement for a labeled capability needs at least one label to resolve the required capability.";

/// Exact message for a SPECIFIED requirement without a reference.
pub const MISSING_REFERENCE_MESSAGE: &str =
    "A requirement for a specified capability needs a valid name and optional namespace to resolve the required capability.";

/// Where to look for candidates: an exact name or a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateLocation {
    Name { namespace: String, name: String },
    Selector {
        namespace: String,
        selector: BTreeMap<String, String>,
    },
}

/// Decision of the matcher.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// An equivalent capability already exists. `spec_changed` is set when
    /// non-essential fields (preferred hostname, TLS secret) were merged and
    /// the spec should be written back.
    ReuseExisting {
        capability: Box<ProvidedCapability>,
        spec_changed: bool,
    },
    /// No capability exists at the computed name/selector; create this one.
    CreateNew(Box<ProvidedCapability>),
    /// The requirement cannot be satisfied; never delegated downstream.
    Conflict(ControllerFailure),
}

/// Compute the candidate location for a requirement, failing fast on the two
/// configuration errors that must never reach the store.
pub fn candidate_location(
    requirement: &CapabilityRequirement,
    requester: &CapabilityRequester,
    config: &OperatorConfig,
) -> Result<CandidateLocation, ControllerFailure> {
    let scope = requirement.resolved_scope();
    match scope {
        CapabilityScope::Cluster => Ok(CandidateLocation::Name {
            namespace: config.cluster_capability_namespace.clone(),
            name: crate::naming::default_capability_name(
                requirement.capability,
                requirement.implementation_or_default(),
                scope,
            ),
        }),
        CapabilityScope::Namespace => Ok(CandidateLocation::Name {
            namespace: requester.namespace.clone(),
            name: crate::naming::default_capability_name(
                requirement.capability,
                requirement.implementation_or_default(),
                scope,
            ),
        }),
        CapabilityScope::Dedicated => Ok(CandidateLocation::Name {
            namespace: requester.namespace.clone(),
            name: crate::naming::dedicated_capability_name(
                &requester.name,
                requirement.capability,
            ),
        }),
        CapabilityScope::Specified => match &requirement.specified_capability {
            Some(reference) => Ok(CandidateLocation::Name {
                namespace: reference
                    .namespace
                    .clone()
                    .unwrap_or_else(|| requester.namespace.clone()),
                name: reference.name.clone(),
            }),
            None => Err(ControllerFailure::new(MISSING_REFERENCE_MESSAGE)),
        },
        CapabilityScope::Labeled => match &requirement.selector {
            Some(selector) if !selector.is_empty() => Ok(CandidateLocation::Selector {
                namespace: requester.namespace.clone(),
                selector: selector.clone(),
            }),
            _ => Err(ControllerFailure::new(MISSING_SELECTOR_MESSAGE)),
        },
    }
}

/// Match a requirement against the candidates found at its location.
pub fn match_capability(
    requirement: &CapabilityRequirement,
    requester: &CapabilityRequester,
    candidates: &[ProvidedCapability],
    config: &OperatorConfig,
) -> MatchOutcome {
    let location = match candidate_location(requirement, requester, config) {
        Ok(location) => location,
        Err(failure) => return MatchOutcome::Conflict(failure),
    };

    let existing = candidates.first();
    let Some(existing) = existing else {
        debug!(
            capability = %requirement.capability,
            scope = %requirement.resolved_scope(),
            "no existing capability found, planning a new one"
        );
        return MatchOutcome::CreateNew(Box::new(plan_capability(
            requirement,
            requester,
            &location,
        )));
    };

    // An implementation-agnostic request defers to whatever is provisioned.
    if let Some(requested) = requirement.implementation {
        let found = existing.implementation_or_default();
        if found != requested {
            return MatchOutcome::Conflict(ControllerFailure::for_object(
                "ProvidedCapability",
                existing.metadata.name.as_deref().unwrap_or_default(),
                format!(
                    "The capability {} was found, but its implementation is {} instead of the requested {}",
                    requirement.capability, found, requested
                ),
                format!(
                    "implementation mismatch on '{}'",
                    existing.metadata.name.as_deref().unwrap_or_default()
                ),
            ));
        }
    }

    // The capability advertises the scope it was resolved at; the requirement
    // must accept that scope.
    if !requirement
        .resolution_scope_preference
        .contains(&existing.spec.scope)
        && !requirement.resolution_scope_preference.is_empty()
    {
        let requested = requirement
            .resolution_scope_preference
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return MatchOutcome::Conflict(ControllerFailure::for_object(
            "ProvidedCapability",
            existing.metadata.name.as_deref().unwrap_or_default(),
            format!(
                "The capability {} was found, but its supported provisioning scopes are '{}' instead of the requested '{}' scopes",
                requirement.capability, existing.spec.scope, requested
            ),
            format!(
                "scope mismatch on '{}'",
                existing.metadata.name.as_deref().unwrap_or_default()
            ),
        ));
    }

    // Reuse, merging any newly supplied non-essential fields in place.
    let mut capability = existing.clone();
    let mut spec_changed = false;
    if capability.spec.preferred_hostname.is_none() && requirement.preferred_hostname.is_some() {
        capability.spec.preferred_hostname = requirement.preferred_hostname.clone();
        spec_changed = true;
    }
    if capability.spec.preferred_tls_secret_name.is_none()
        && requirement.preferred_tls_secret_name.is_some()
    {
        capability.spec.preferred_tls_secret_name = requirement.preferred_tls_secret_name.clone();
        spec_changed = true;
    }
    MatchOutcome::ReuseExisting {
        capability: Box::new(capability),
        spec_changed,
    }
}

/// Build the `ProvidedCapability` a CreateNew outcome will persist, recording
/// the ownership edge from the requester.
fn plan_capability(
    requirement: &CapabilityRequirement,
    requester: &CapabilityRequester,
    location: &CandidateLocation,
) -> ProvidedCapability {
    let (namespace, name, selector) = match location {
        CandidateLocation::Name { namespace, name } => {
            (namespace.clone(), name.clone(), requirement.selector.clone())
        }
        CandidateLocation::Selector {
            namespace,
            selector,
        } => (
            namespace.clone(),
            crate::naming::labeled_capability_name(
                requirement.capability,
                requirement.implementation_or_default(),
                selector,
            ),
            Some(selector.clone()),
        ),
    };

    let mut labels = selector.clone().unwrap_or_default();
    labels.insert(
        constants::OWNER_KIND_LABEL.to_string(),
        requester.kind.clone(),
    );
    labels.insert(
        constants::OWNER_NAME_LABEL.to_string(),
        requester.name.clone(),
    );
    let annotations = BTreeMap::from([(
        constants::OWNER_UID_ANNOTATION.to_string(),
        requester.uid.clone(),
    )]);
    // Native owner references only hold within one namespace; the labels and
    // UID annotation above carry the ownership edge in every case.
    let owner_references = if namespace == requester.namespace {
        Some(vec![requester.owner_reference()])
    } else {
        None
    };

    let mut capability = ProvidedCapability::new(
        &name,
        ProvidedCapabilitySpec {
            capability: requirement.capability,
            implementation: Some(requirement.implementation_or_default()),
            scope: requirement.resolved_scope(),
            provisioning_strategy: requirement.provisioning_strategy,
            specified_capability: requirement.specified_capability.clone(),
            selector,
            preferred_hostname: requirement.preferred_hostname.clone(),
            preferred_tls_secret_name: requirement.preferred_tls_secret_name.clone(),
            capability_parameters: requirement.capability_parameters.clone(),
            externally_provided_service: requirement.externally_provided_service.clone(),
        },
    );
    capability.metadata = ObjectMeta {
        name: Some(name),
        namespace: Some(namespace),
        labels: Some(labels),
        annotations: Some(annotations),
        owner_references,
        ..ObjectMeta::default()
    };
    capability
}
