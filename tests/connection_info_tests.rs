//! Connection-info adapter tests over full provisioning runs.

mod common;

use capability_controller::connection::{DatabaseConnectionInfo, SsoConnectionInfo};
use capability_controller::crd::{
    CapabilityImplementation, CapabilityKind, CapabilityRequirement, CapabilityScope,
};
use capability_controller::provisioning::CapabilityProvider;
use capability_controller::store::InMemoryCapabilityStore;
use common::*;
use std::sync::Arc;

fn provider(store: &InMemoryCapabilityStore) -> CapabilityProvider<InMemoryCapabilityStore> {
    CapabilityProvider::new(Arc::new(store.clone()), test_config())
}

#[tokio::test]
async fn database_connection_info_exposes_the_provisioned_endpoint() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_deployment_controller(&store, TEST_NAMESPACE, "my-app-db");

    let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Mysql)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .parameter("jdbc-useSSL", "false")
        .parameter("jdbc-characterEncoding", "utf8")
        .parameter("unrelated", "ignored")
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();
    assert!(!result.has_failed(), "{:?}", result.controller_failure);

    let info = DatabaseConnectionInfo::from_result(&result).unwrap();
    assert_eq!(info.vendor, CapabilityImplementation::Mysql);
    assert_eq!(info.database_name, "my_app_db");
    assert_eq!(
        info.host,
        "my-app-db-service.my-namespace.svc.cluster.local"
    );
    assert_eq!(info.port, 3306);
    assert_eq!(info.admin_secret_name, "my-app-db-admin-secret");
    assert_eq!(
        info.jdbc_parameters.get("useSSL").map(String::as_str),
        Some("false")
    );
    assert_eq!(
        info.jdbc_parameters
            .get("characterEncoding")
            .map(String::as_str),
        Some("utf8")
    );
    assert!(!info.jdbc_parameters.contains_key("unrelated"));

    assert_eq!(info.username(&result).as_deref(), Some("admin"));
    assert_eq!(info.password(&result).as_deref(), Some("P4ssw0rd"));
}

#[tokio::test]
async fn database_connection_info_respects_an_explicit_port_parameter() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_deployment_controller(&store, TEST_NAMESPACE, "my-app-db");

    let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .implementation(CapabilityImplementation::Postgresql)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .parameter("port", "5433")
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();
    assert!(!result.has_failed());

    let info = DatabaseConnectionInfo::from_result(&result).unwrap();
    assert_eq!(info.vendor, CapabilityImplementation::Postgresql);
    assert_eq!(info.port, 5433);
}

#[tokio::test]
async fn sso_connection_info_exposes_the_internal_endpoint_and_credentials() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_deployment_controller(&store, TEST_NAMESPACE, "my-app-sso");

    let requirement = CapabilityRequirement::builder(CapabilityKind::Sso)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .parameter("realm", "platform")
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();
    assert!(!result.has_failed(), "{:?}", result.controller_failure);

    let info = SsoConnectionInfo::from_result(&result).unwrap();
    assert_eq!(
        info.internal_base_url.as_deref(),
        Some("http://my-app-sso-service.my-namespace.svc.cluster.local:8080")
    );
    assert_eq!(info.realm, "platform");
    assert_eq!(info.username.as_deref(), Some("admin"));
    assert_eq!(info.password.as_deref(), Some("P4ssw0rd"));
}

#[tokio::test]
async fn adapters_return_none_for_failed_results() {
    let store = InMemoryCapabilityStore::new();
    let provider = provider(&store);
    spawn_failing_deployment_controller(&store, TEST_NAMESPACE, "my-app-db", "disk full");

    let requirement = CapabilityRequirement::builder(CapabilityKind::Dbms)
        .with_resolution_scope_preference(vec![CapabilityScope::Dedicated])
        .build();
    let result = provider
        .provide_capability(&requester(), &requirement, test_timeouts())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert!(DatabaseConnectionInfo::from_result(&result).is_none());
    assert!(SsoConnectionInfo::from_result(&result).is_none());
}
