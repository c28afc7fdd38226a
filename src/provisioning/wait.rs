//! # Bounded Waits
//!
//! Polling-with-timeout against the cluster resource store. These are the
//! only blocking operations in the provisioning flow: a fixed poll interval,
//! a hard deadline, and a clean abandon on expiry. The underlying capability
//! is never cancelled or rolled back when a wait expires, so a later retry
//! with the same computed name converges on the same object.

use crate::crd::ProvidedCapability;
use crate::error::CapabilityError;
use crate::store::CapabilityStore;
use std::time::{Duration, Instant};
use tracing::trace;

/// Poll `namespace/name` until `predicate` holds or `timeout` expires.
///
/// Returns `Ok(Some(capability))` with the first observation satisfying the
/// predicate, or `Ok(None)` on deadline expiry. A capability deleted out from
/// under the wait keeps polling until the deadline; deletion mid-provisioning
/// is indistinguishable from "not yet written" at this layer.
pub async fn await_capability<S, P>(
    store: &S,
    namespace: &str,
    name: &str,
    predicate: P,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<ProvidedCapability>, CapabilityError>
where
    S: CapabilityStore + ?Sized,
    P: Fn(&ProvidedCapability) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(capability) = store.load_capability(namespace, name).await? {
            if predicate(&capability) {
                return Ok(Some(capability));
            }
        }
        let now = Instant::now();
        if now >= deadline {
            trace!(%namespace, %name, "wait deadline expired");
            return Ok(None);
        }
        let remaining = deadline - now;
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        CapabilityKind, CapabilityScope, ProvidedCapabilitySpec, ProvisioningStrategy,
    };
    use crate::store::InMemoryCapabilityStore;
    use std::collections::BTreeMap;

    fn capability(name: &str) -> ProvidedCapability {
        let mut capability = ProvidedCapability::new(
            name,
            ProvidedCapabilitySpec {
                capability: CapabilityKind::Dbms,
                implementation: None,
                scope: CapabilityScope::Namespace,
                provisioning_strategy: ProvisioningStrategy::DeployDirectly,
                specified_capability: None,
                selector: None,
                preferred_hostname: None,
                preferred_tls_secret_name: None,
                capability_parameters: BTreeMap::new(),
                externally_provided_service: None,
            },
        );
        capability.metadata.namespace = Some("test-ns".to_string());
        capability
    }

    #[tokio::test]
    async fn returns_none_when_deadline_expires() {
        let store = InMemoryCapabilityStore::new();
        let observed = await_capability(
            &store,
            "test-ns",
            "absent",
            |_| true,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(observed.is_none());
    }

    #[tokio::test]
    async fn observes_capability_once_predicate_holds() {
        use crate::store::CapabilityStore as _;
        let store = InMemoryCapabilityStore::new();
        store.create_if_absent(capability("present")).await.unwrap();

        let observed = await_capability(
            &store,
            "test-ns",
            "present",
            |c| c.metadata.uid.is_some(),
            Duration::from_millis(200),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(observed.is_some());
    }
}
