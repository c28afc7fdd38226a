//! # Capability Controller Entrypoint
//!
//! Streams `ProvidedCapability` events across all namespaces and logs phase
//! transitions and reported failures. Requesting controllers link the library
//! directly; this binary gives operators a live view of capability
//! provisioning in a cluster.

use anyhow::{Context, Result};
use capability_controller::config::OperatorConfig;
use capability_controller::crd::ProvidedCapability;
use futures::StreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any other operations
    // Required for rustls 0.23+ when no default provider is set via features
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capability_controller=info".into()),
        )
        .init();

    let config = OperatorConfig::from_env();
    info!(
        cluster_capability_namespace = %config.cluster_capability_namespace,
        "Starting capability controller"
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    // Watch all namespaces so capabilities can live wherever their scope
    // resolves them.
    let capabilities: Api<ProvidedCapability> = Api::all(client);
    let mut stream = watcher(capabilities, watcher::Config::default())
        .applied_objects()
        .boxed();

    while let Some(event) = stream.next().await {
        match event {
            Ok(capability) => log_capability(&capability),
            Err(error) => error!("Watch stream error: {error}"),
        }
    }

    info!("Capability controller stopped");
    Ok(())
}

fn log_capability(capability: &ProvidedCapability) {
    let name = capability.name_any();
    let namespace = capability
        .namespace()
        .unwrap_or_else(|| "default".to_string());
    let Some(status) = &capability.status else {
        info!(%namespace, %name, "capability requested, awaiting deployment");
        return;
    };
    match status.find_failed_server_status() {
        Some(failed) => {
            let message = failed
                .failure
                .as_ref()
                .map_or("unknown failure", |f| f.message.as_str());
            warn!(
                %namespace, %name,
                phase = %status.phase,
                qualifier = %failed.qualifier,
                %message,
                "capability deployment failed"
            );
        }
        None => info!(%namespace, %name, phase = %status.phase, "capability phase update"),
    }
}
