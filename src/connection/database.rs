//! # Database Connection Info
//!
//! Read-only view over a provisioned DBMS capability.

use crate::constants;
use crate::crd::CapabilityImplementation;
use crate::naming;
use crate::provisioning::CapabilityProvisioningResult;
use std::collections::BTreeMap;

/// Prefix marking capability parameters that are JDBC driver options.
const JDBC_PARAMETER_PREFIX: &str = "jdbc-";

/// Connection descriptor for a database capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConnectionInfo {
    pub vendor: CapabilityImplementation,
    /// Database name derived from the capability name, `-` replaced with `_`
    pub database_name: String,
    /// Cluster-internal service hostname, or the external host
    pub host: String,
    pub port: i32,
    pub admin_secret_name: String,
    /// Vendor-specific JDBC parameters, `jdbc-` prefix stripped
    pub jdbc_parameters: BTreeMap<String, String>,
}

impl DatabaseConnectionInfo {
    /// Build from a successful provisioning result. Returns `None` when the
    /// result failed or carries no capability.
    pub fn from_result(result: &CapabilityProvisioningResult) -> Option<Self> {
        if result.has_failed() {
            return None;
        }
        let capability = result.provided_capability.as_ref()?;
        let name = capability.metadata.name.as_deref()?;
        let namespace = capability.metadata.namespace.as_deref().unwrap_or("default");
        let vendor = capability.implementation_or_default();
        let main_status = result.main_server_status();

        let (host, port) = match &capability.spec.externally_provided_service {
            Some(external) => (
                external.host.clone().unwrap_or_default(),
                external
                    .port
                    .or_else(|| vendor.default_port())
                    .unwrap_or_default(),
            ),
            None => {
                let service_name = main_status
                    .and_then(|s| s.service_name.clone())
                    .unwrap_or_else(|| naming::service_name(name));
                let port = capability
                    .spec
                    .capability_parameters
                    .get("port")
                    .and_then(|p| p.parse().ok())
                    .or_else(|| vendor.default_port())
                    .unwrap_or_default();
                (naming::internal_hostname(&service_name, namespace), port)
            }
        };

        let mut jdbc_parameters: BTreeMap<String, String> = capability
            .spec
            .capability_parameters
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(JDBC_PARAMETER_PREFIX)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect();
        if let Some(status) = main_status {
            for (key, value) in &status.derived_deployment_parameters {
                if let Some(stripped) = key.strip_prefix(JDBC_PARAMETER_PREFIX) {
                    jdbc_parameters.insert(stripped.to_string(), value.clone());
                }
            }
        }

        let admin_secret_name = main_status
            .and_then(|s| s.admin_secret_name.clone())
            .or_else(|| {
                capability
                    .spec
                    .externally_provided_service
                    .as_ref()
                    .and_then(|e| e.admin_secret_name.clone())
            })
            .unwrap_or_else(|| naming::admin_secret_name(name));

        Some(Self {
            vendor,
            database_name: name.replace('-', "_"),
            host,
            port,
            admin_secret_name,
            jdbc_parameters,
        })
    }

    /// Admin username from the result's secret, under the conventional key.
    pub fn username(&self, result: &CapabilityProvisioningResult) -> Option<String> {
        result
            .admin_secret
            .as_ref()
            .and_then(|secret| super::secret_value(secret, constants::USERNAME_KEY))
    }

    /// Admin password from the result's secret, under the conventional key.
    pub fn password(&self, result: &CapabilityProvisioningResult) -> Option<String> {
        result
            .admin_secret
            .as_ref()
            .and_then(|secret| super::secret_value(secret, constants::PASSWORD_KEY))
    }
}
