//! # Capability Requirements
//!
//! The transient request descriptor handed to the provisioning state machine.
//! A requirement is never persisted; it is built by a requesting controller,
//! resolved against the resource store, and discarded.

use crate::crd::capability::{
    CapabilityImplementation, CapabilityKind, CapabilityScope, ExternallyProvidedService,
    ProvisioningStrategy, ResourceReference,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request for an abstract capability.
///
/// Serialized as a structured object when crossing a process boundary, hence
/// the serde derives, but it carries no resource metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequirement {
    pub capability: CapabilityKind,
    #[serde(default)]
    pub implementation: Option<CapabilityImplementation>,
    /// Acceptable resolution scopes, most preferred first
    #[serde(default)]
    pub resolution_scope_preference: Vec<CapabilityScope>,
    #[serde(default)]
    pub provisioning_strategy: ProvisioningStrategy,
    #[serde(default)]
    pub specified_capability: Option<ResourceReference>,
    #[serde(default)]
    pub selector: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub preferred_hostname: Option<String>,
    #[serde(default)]
    pub preferred_tls_secret_name: Option<String>,
    #[serde(default)]
    pub capability_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub externally_provided_service: Option<ExternallyProvidedService>,
}

impl CapabilityRequirement {
    pub fn builder(capability: CapabilityKind) -> CapabilityRequirementBuilder {
        CapabilityRequirementBuilder::new(capability)
    }

    /// The scope this requirement resolves at: the first preference, or
    /// NAMESPACE when no preference was expressed.
    pub fn resolved_scope(&self) -> CapabilityScope {
        self.resolution_scope_preference
            .first()
            .copied()
            .unwrap_or(CapabilityScope::Namespace)
    }

    /// The implementation in effect, falling back to the kind's default.
    pub fn implementation_or_default(&self) -> CapabilityImplementation {
        self.implementation
            .unwrap_or_else(|| self.capability.default_implementation())
    }
}

/// Fluent builder for [`CapabilityRequirement`].
#[derive(Debug, Clone)]
pub struct CapabilityRequirementBuilder {
    requirement: CapabilityRequirement,
}

impl CapabilityRequirementBuilder {
    pub fn new(capability: CapabilityKind) -> Self {
        Self {
            requirement: CapabilityRequirement {
                capability,
                implementation: None,
                resolution_scope_preference: Vec::new(),
                provisioning_strategy: ProvisioningStrategy::default(),
                specified_capability: None,
                selector: None,
                preferred_hostname: None,
                preferred_tls_secret_name: None,
                capability_parameters: BTreeMap::new(),
                externally_provided_service: None,
            },
        }
    }

    pub fn implementation(mut self, implementation: CapabilityImplementation) -> Self {
        self.requirement.implementation = Some(implementation);
        self
    }

    pub fn with_resolution_scope_preference(mut self, scopes: Vec<CapabilityScope>) -> Self {
        self.requirement.resolution_scope_preference = scopes;
        self
    }

    pub fn provisioning_strategy(mut self, strategy: ProvisioningStrategy) -> Self {
        self.requirement.provisioning_strategy = strategy;
        self
    }

    pub fn specified_capability(mut self, reference: ResourceReference) -> Self {
        self.requirement.specified_capability = Some(reference);
        self
    }

    pub fn selector(mut self, selector: BTreeMap<String, String>) -> Self {
        self.requirement.selector = Some(selector);
        self
    }

    pub fn preferred_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.requirement.preferred_hostname = Some(hostname.into());
        self
    }

    pub fn preferred_tls_secret(mut self, secret_name: impl Into<String>) -> Self {
        self.requirement.preferred_tls_secret_name = Some(secret_name.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirement
            .capability_parameters
            .insert(key.into(), value.into());
        self
    }

    pub fn externally_provided_service(mut self, service: ExternallyProvidedService) -> Self {
        self.requirement.externally_provided_service = Some(service);
        self
    }

    pub fn build(self) -> CapabilityRequirement {
        self.requirement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_scope_defaults_to_namespace() {
        let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms).build();
        assert_eq!(requirement.resolved_scope(), CapabilityScope::Namespace);

        let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms)
            .with_resolution_scope_preference(vec![
                CapabilityScope::Dedicated,
                CapabilityScope::Namespace,
            ])
            .build();
        assert_eq!(requirement.resolved_scope(), CapabilityScope::Dedicated);
    }

    #[test]
    fn builder_round_trips_through_serde() {
        let requirement = CapabilityRequirement::builder(CapabilityKind::Sso)
            .implementation(CapabilityImplementation::Keycloak)
            .with_resolution_scope_preference(vec![CapabilityScope::Cluster])
            .preferred_hostname("sso.apps.example.com")
            .parameter("realm", "shared")
            .build();

        let json = serde_json::to_string(&requirement).unwrap();
        let parsed: CapabilityRequirement = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, requirement);
    }
}
