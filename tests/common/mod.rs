//! Shared helpers for the capability provisioning test suite.
//!
//! The simulated deployment controller preserves the timing contract of the
//! real out-of-process controller: a commencement signal (phase started)
//! strictly before the completion signal (terminal phase), both observed only
//! through the store.

#![allow(dead_code)]

use capability_controller::config::OperatorConfig;
use capability_controller::constants;
use capability_controller::crd::{
    CapabilityRequester, ControllerFailure, DeploymentPhase, ServerStatus,
};
use capability_controller::naming;
use capability_controller::provisioning::ProvisioningTimeouts;
use capability_controller::store::{CapabilityStore, InMemoryCapabilityStore};
use k8s_openapi::api::core::v1::{Secret, Service};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const TEST_NAMESPACE: &str = "my-namespace";

pub fn requester() -> CapabilityRequester {
    CapabilityRequester::new("App", TEST_NAMESPACE, "my-app", "uid-my-app")
}

/// Config with a fast poll interval so waits resolve promptly in tests.
pub fn test_config() -> OperatorConfig {
    OperatorConfig {
        poll_interval: Duration::from_millis(10),
        ..OperatorConfig::default()
    }
}

pub fn test_timeouts() -> ProvisioningTimeouts {
    ProvisioningTimeouts {
        commencement: Duration::from_secs(2),
        completion: Duration::from_secs(5),
    }
}

pub fn admin_secret(namespace: &str, name: &str) -> Secret {
    let mut secret = Secret::default();
    secret.metadata.namespace = Some(namespace.to_string());
    secret.metadata.name = Some(name.to_string());
    secret.string_data = Some(BTreeMap::from([
        (constants::USERNAME_KEY.to_string(), "admin".to_string()),
        (constants::PASSWORD_KEY.to_string(), "P4ssw0rd".to_string()),
    ]));
    secret
}

fn service(namespace: &str, name: &str) -> Service {
    let mut service = Service::default();
    service.metadata.namespace = Some(namespace.to_string());
    service.metadata.name = Some(name.to_string());
    service
}

async fn await_pickup(store: &InMemoryCapabilityStore, namespace: &str, name: &str) -> bool {
    for _ in 0..200 {
        if store
            .load_capability(namespace, name)
            .await
            .unwrap()
            .is_some()
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Spawn a task standing in for the out-of-process deployment controller:
/// wait for the capability to appear, signal commencement, deploy the
/// backing Service and admin Secret, then signal completion.
pub fn spawn_deployment_controller(
    store: &InMemoryCapabilityStore,
    namespace: &str,
    name: &str,
) -> JoinHandle<()> {
    let store = store.clone();
    let namespace = namespace.to_string();
    let name = name.to_string();
    tokio::spawn(async move {
        if !await_pickup(&store, &namespace, &name).await {
            return;
        }
        let capability = store
            .load_capability(&namespace, &name)
            .await
            .unwrap()
            .unwrap();
        let generation = capability.metadata.generation;

        // Commencement strictly before completion
        store
            .update_phase(&namespace, &name, DeploymentPhase::Started, generation)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let service_name = naming::service_name(&name);
        let secret_name = naming::admin_secret_name(&name);
        store.put_service(service(&namespace, &service_name));
        store
            .create_secret_if_absent(admin_secret(&namespace, &secret_name))
            .await
            .unwrap();

        let mut status = ServerStatus::new(constants::MAIN_QUALIFIER);
        status.service_name = Some(service_name);
        status.admin_secret_name = Some(secret_name);
        status.internal_base_url = Some(format!(
            "http://{}:8080",
            naming::internal_hostname(&naming::service_name(&name), &namespace)
        ));
        store.update_status(&namespace, &name, status).await.unwrap();
        store
            .update_phase(&namespace, &name, DeploymentPhase::Successful, generation)
            .await
            .unwrap();
    })
}

/// A controller that picks the capability up and then reports a failure.
pub fn spawn_failing_deployment_controller(
    store: &InMemoryCapabilityStore,
    namespace: &str,
    name: &str,
    message: &str,
) -> JoinHandle<()> {
    let store = store.clone();
    let namespace = namespace.to_string();
    let name = name.to_string();
    let message = message.to_string();
    tokio::spawn(async move {
        if !await_pickup(&store, &namespace, &name).await {
            return;
        }
        let capability = store
            .load_capability(&namespace, &name)
            .await
            .unwrap()
            .unwrap();
        let generation = capability.metadata.generation;
        store
            .update_phase(&namespace, &name, DeploymentPhase::Started, generation)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let failure = ControllerFailure::for_object(
            "Deployment",
            format!("{name}-deployment"),
            message.clone(),
            format!("deployment of {name} failed: {message}"),
        );
        store
            .update_status(
                &namespace,
                &name,
                ServerStatus::with_failure(constants::MAIN_QUALIFIER, failure),
            )
            .await
            .unwrap();
        store
            .update_phase(&namespace, &name, DeploymentPhase::Failed, generation)
            .await
            .unwrap();
    })
}

/// A controller that commences work but never reaches a terminal phase.
pub fn spawn_stalled_deployment_controller(
    store: &InMemoryCapabilityStore,
    namespace: &str,
    name: &str,
) -> JoinHandle<()> {
    let store = store.clone();
    let namespace = namespace.to_string();
    let name = name.to_string();
    tokio::spawn(async move {
        if !await_pickup(&store, &namespace, &name).await {
            return;
        }
        let capability = store
            .load_capability(&namespace, &name)
            .await
            .unwrap()
            .unwrap();
        store
            .update_phase(
                &namespace,
                &name,
                DeploymentPhase::Started,
                capability.metadata.generation,
            )
            .await
            .unwrap();
        // Never writes a terminal phase
    })
}
