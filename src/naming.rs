//! # Resource Naming and Scope Resolution
//!
//! Pure functions computing deterministic resource names from capability
//! kind, implementation, scope and requester identity. Names are never
//! random: equivalent requests must compute the same name so repeated
//! resolution converges on the same object.
//!
//! The `<name>-service` / `<name>-admin-secret` convention is load-bearing
//! for downstream lookups and must stay exact.

use crate::constants;
use crate::crd::{CapabilityImplementation, CapabilityKind, CapabilityScope};
use std::collections::BTreeMap;

/// Name for CLUSTER- and NAMESPACE-scope capabilities, e.g.
/// `default-mysql-dbms-in-cluster`.
pub fn default_capability_name(
    kind: CapabilityKind,
    implementation: CapabilityImplementation,
    scope: CapabilityScope,
) -> String {
    format!(
        "default-{}-{}-in-{}",
        implementation.name_fragment(),
        kind.name_fragment(),
        scope.name_fragment()
    )
}

/// Name for DEDICATED-scope capabilities, derived from the requester's own
/// name plus a capability-kind suffix, e.g. `my-app-db`.
pub fn dedicated_capability_name(requester_name: &str, kind: CapabilityKind) -> String {
    format!("{}-{}", requester_name, kind.dedicated_suffix())
}

/// Name for LABELED-scope capabilities.
///
/// The qualifier is a short FNV-1a hash of the sorted selector, so equal
/// selectors always compute the same name while actual uniqueness is enforced
/// through the selector, not the name.
pub fn labeled_capability_name(
    kind: CapabilityKind,
    implementation: CapabilityImplementation,
    selector: &BTreeMap<String, String>,
) -> String {
    format!(
        "{}-{}-{}",
        implementation.name_fragment(),
        kind.name_fragment(),
        selector_qualifier(selector)
    )
}

/// Deterministic qualifier for a label selector (8 hex digits, FNV-1a).
pub fn selector_qualifier(selector: &BTreeMap<String, String>) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    // BTreeMap iteration is already sorted by key
    for (key, value) in selector {
        for byte in key.bytes().chain([b'='].into_iter()).chain(value.bytes()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash ^= u64::from(b',');
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{:08x}", (hash >> 32) as u32 ^ hash as u32)
}

/// Service name associated with a capability.
pub fn service_name(capability_name: &str) -> String {
    format!("{capability_name}{}", constants::SERVICE_SUFFIX)
}

/// Admin secret name associated with a capability.
pub fn admin_secret_name(capability_name: &str) -> String {
    format!("{capability_name}{}", constants::ADMIN_SECRET_SUFFIX)
}

/// Cluster-internal hostname of a namespaced Service.
pub fn internal_hostname(service_name: &str, namespace: &str) -> String {
    format!("{service_name}.{namespace}.svc.cluster.local")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_scope_mysql_dbms_naming_contract() {
        let name = default_capability_name(
            CapabilityKind::Dbms,
            CapabilityImplementation::Mysql,
            CapabilityScope::Cluster,
        );
        assert_eq!(name, "default-mysql-dbms-in-cluster");
        assert_eq!(service_name(&name), "default-mysql-dbms-in-cluster-service");
        assert_eq!(
            admin_secret_name(&name),
            "default-mysql-dbms-in-cluster-admin-secret"
        );
    }

    #[test]
    fn namespace_scope_uses_namespace_fragment() {
        assert_eq!(
            default_capability_name(
                CapabilityKind::Sso,
                CapabilityImplementation::Keycloak,
                CapabilityScope::Namespace,
            ),
            "default-keycloak-sso-in-namespace"
        );
    }

    #[test]
    fn dedicated_names_derive_from_requester() {
        assert_eq!(
            dedicated_capability_name("my-app", CapabilityKind::Dbms),
            "my-app-db"
        );
        assert_eq!(
            dedicated_capability_name("my-app", CapabilityKind::Sso),
            "my-app-sso"
        );
    }

    #[test]
    fn labeled_names_are_deterministic_per_selector() {
        let mut selector = BTreeMap::new();
        selector.insert("tier".to_string(), "shared".to_string());
        selector.insert("env".to_string(), "prod".to_string());

        let first = labeled_capability_name(
            CapabilityKind::Dbms,
            CapabilityImplementation::Postgresql,
            &selector,
        );
        let second = labeled_capability_name(
            CapabilityKind::Dbms,
            CapabilityImplementation::Postgresql,
            &selector,
        );
        assert_eq!(first, second);
        assert!(first.starts_with("postgresql-dbms-"));

        let mut other = selector.clone();
        other.insert("extra".to_string(), "label".to_string());
        let third = labeled_capability_name(
            CapabilityKind::Dbms,
            CapabilityImplementation::Postgresql,
            &other,
        );
        assert_ne!(first, third);
    }

    #[test]
    fn internal_hostnames_follow_cluster_dns() {
        assert_eq!(
            internal_hostname("my-app-db-service", "my-namespace"),
            "my-app-db-service.my-namespace.svc.cluster.local"
        );
    }
}
