//! # Operator Configuration
//!
//! Immutable configuration for the capability controller.
//!
//! Built once at process start and passed by reference into the matcher and
//! the provisioning state machine. Core logic never reads ambient global
//! state; `from_env` is the single place environment variables are consulted,
//! intended for binary entry points only.

use crate::constants;
use std::time::Duration;

/// Immutable controller configuration.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Namespace where capabilities resolved at CLUSTER scope live.
    pub cluster_capability_namespace: String,
    /// How long to wait for a deployment controller to pick up a capability.
    pub commencement_timeout: Duration,
    /// How long to wait for a capability to reach a terminal phase.
    pub completion_timeout: Duration,
    /// Fixed interval between polls of the resource store during waits.
    pub poll_interval: Duration,
    /// Default routing suffix for externally reachable hostnames, if any.
    pub default_routing_suffix: Option<String>,
    /// Default TLS secret applied when a requirement does not name one.
    pub default_tls_secret_name: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            cluster_capability_namespace: constants::DEFAULT_CLUSTER_CAPABILITY_NAMESPACE
                .to_string(),
            commencement_timeout: Duration::from_secs(
                constants::DEFAULT_COMMENCEMENT_TIMEOUT_SECS,
            ),
            completion_timeout: Duration::from_secs(constants::DEFAULT_COMPLETION_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
            default_routing_suffix: None,
            default_tls_secret_name: None,
        }
    }
}

impl OperatorConfig {
    /// Build configuration from `CAPABILITY_*` environment variables,
    /// falling back to the defaults above for anything unset.
    ///
    /// Only binary entry points should call this; library consumers pass an
    /// explicit config.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cluster_capability_namespace: std::env::var("CAPABILITY_CLUSTER_NAMESPACE")
                .unwrap_or(defaults.cluster_capability_namespace),
            commencement_timeout: env_secs("CAPABILITY_COMMENCEMENT_TIMEOUT_SECS")
                .unwrap_or(defaults.commencement_timeout),
            completion_timeout: env_secs("CAPABILITY_COMPLETION_TIMEOUT_SECS")
                .unwrap_or(defaults.completion_timeout),
            poll_interval: defaults.poll_interval,
            default_routing_suffix: std::env::var("CAPABILITY_ROUTING_SUFFIX").ok(),
            default_tls_secret_name: std::env::var("CAPABILITY_DEFAULT_TLS_SECRET").ok(),
        }
    }
}

fn env_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_constants() {
        let config = OperatorConfig::default();
        assert_eq!(config.cluster_capability_namespace, "capability-system");
        assert_eq!(config.commencement_timeout, Duration::from_secs(60));
        assert_eq!(config.completion_timeout, Duration::from_secs(600));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }
}
