//! Conflict and fail-fast tests.
//!
//! Conflicts surface as data in the result, with exact messages, and are
//! never delegated to a deployment controller. Invalid requirements fail
//! before any capability is written to the store.

mod common;

use capability_controller::crd::{
    CapabilityImplementation, CapabilityKind, CapabilityRequirement, CapabilityScope,
    ResourceReference,
};
use capability_controller::matcher::{MISSING_REFERENCE_MESSAGE, MISSING_SELECTOR_MESSAGE};
use capability_controller::provisioning::CapabilityProvider;
use capability_controller::store::{CapabilityStore, InMemoryCapabilityStore};
use common::*;
use std::sync::Arc;

fn provider(store: &InMemoryCapabilityStore) -> CapabilityProvider<InMemoryCapabilityStore> {
    CapabilityProvider::new(Arc::new(store.clone()), test_config())
}

#[tokio::test]
async fn implementation_mismatch_surfaces_the_exact_message() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_deployment_controller(&store, TEST_NAMESPACE, "my-app-db");

    let first = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Postgresql)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .build();
    let first_result = provider
        .provide_capability(&requester(), &first, test_timeouts())
        .await
        .unwrap();
    assert!(!first_result.has_failed());

    let second = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Mysql)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .build();
    let second_result = provider
        .provide_capability(&requester(), &second, test_timeouts())
        .await
        .unwrap();

    assert!(second_result.has_failed());
    let failure = second_result.controller_failure.as_ref().unwrap();
    assert_eq!(
        failure.message,
        "The capability DBMS was found, but its implementation is POSTGRESQL instead of the requested MYSQL"
    );
    // The existing capability is untouched and still the only one
    assert_eq!(store.capability_count(), 1);
    let existing = store
        .load_capability(TEST_NAMESPACE, "my-app-db")
        .await
        .unwrap()
        .unwrap();
    assert!(!existing.status.unwrap_or_default().has_failed());
}

#[tokio::test]
async fn scope_mismatch_surfaces_the_exact_message() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_deployment_controller(&store, TEST_NAMESPACE, "my-app-db");

    let first = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Mysql)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .build();
    let first_result = provider
        .provide_capability(&requester(), &first, test_timeouts())
        .await
        .unwrap();
    assert!(!first_result.has_failed());

    // The same resource, addressed by name, but only SPECIFIED scope accepted
    let second = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Mysql)
        .with_resolution_scope_preference(vec![CapabilityScope::Specified])
        .specified_capability(ResourceReference {
            namespace: Some(TEST_NAMESPACE.to_string()),
            name: "my-app-db".to_string(),
        })
        .build();
    let second_result = provider
        .provide_capability(&requester(), &second, test_timeouts())
        .await
        .unwrap();

    assert!(second_result.has_failed());
    let failure = second_result.controller_failure.as_ref().unwrap();
    assert_eq!(
        failure.message,
        "The capability DBMS was found, but its supported provisioning scopes are 'DEDICATED' instead of the requested 'SPECIFIED' scopes"
    );
}

#[tokio::test]
async fn labeled_requirement_without_selector_fails_before_any_store_write() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);

    let requirement = CapabilityRequirement::builder(CapabilityKind::Sso)
        .with_resolution_scope_preference(vec![CapabilityScope::Labeled])
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert_eq!(
        result.controller_failure.as_ref().unwrap().message,
        MISSING_SELECTOR_MESSAGE
    );
    assert!(result.provided_capability.is_none());
    assert_eq!(store.capability_count(), 0);
}

#[tokio::test]
async fn specified_requirement_without_reference_fails_before_any_store_write() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);

    let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .with_resolution_scope_preference(vec![CapabilityScope::Specified])
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert_eq!(
        result.controller_failure.as_ref().unwrap().message,
        MISSING_REFERENCE_MESSAGE
    );
    assert_eq!(store.capability_count(), 0);
}
