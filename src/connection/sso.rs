//! # SSO Connection Info
//!
//! Read-only view over a provisioned SSO/identity capability.

use crate::constants;
use crate::naming;
use crate::provisioning::CapabilityProvisioningResult;

/// Realm used when neither the status nor the parameters name one.
const DEFAULT_REALM: &str = "master";

/// Connection descriptor for an SSO capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoConnectionInfo {
    /// Base URL reachable from outside the cluster
    pub external_base_url: Option<String>,
    /// Base URL reachable from inside the cluster
    pub internal_base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub realm: String,
}

impl SsoConnectionInfo {
    /// Build from a successful provisioning result. Returns `None` when the
    /// result failed or carries no capability.
    pub fn from_result(result: &CapabilityProvisioningResult) -> Option<Self> {
        if result.has_failed() {
            return None;
        }
        let capability = result.provided_capability.as_ref()?;
        let name = capability.metadata.name.as_deref()?;
        let namespace = capability.metadata.namespace.as_deref().unwrap_or("default");
        let main_status = result.main_server_status();

        let external_base_url = main_status
            .and_then(|s| s.external_base_url.clone())
            .or_else(|| {
                capability
                    .spec
                    .preferred_hostname
                    .as_ref()
                    .map(|host| format!("https://{host}"))
            });
        let internal_base_url = main_status
            .and_then(|s| s.internal_base_url.clone())
            .or_else(|| {
                let service_name = main_status
                    .and_then(|s| s.service_name.clone())
                    .unwrap_or_else(|| naming::service_name(name));
                Some(format!(
                    "http://{}:8080",
                    naming::internal_hostname(&service_name, namespace)
                ))
            });

        let username = result
            .admin_secret
            .as_ref()
            .and_then(|secret| super::secret_value(secret, constants::USERNAME_KEY));
        let password = result
            .admin_secret
            .as_ref()
            .and_then(|secret| super::secret_value(secret, constants::PASSWORD_KEY));

        let realm = main_status
            .and_then(|s| s.sso_realm.clone())
            .or_else(|| capability.spec.capability_parameters.get("realm").cloned())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());

        Some(Self {
            external_base_url,
            internal_base_url,
            username,
            password,
            realm,
        })
    }
}
