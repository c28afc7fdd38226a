//! # Constants
//!
//! Shared constants used throughout the controller library.
//!
//! These values represent reasonable defaults and can be overridden via
//! [`OperatorConfig`](crate::config::OperatorConfig) where applicable.

/// Default bounded wait for a deployment controller to pick up a newly
/// created `ProvidedCapability` (seconds)
pub const DEFAULT_COMMENCEMENT_TIMEOUT_SECS: u64 = 60;

/// Default bounded wait for a `ProvidedCapability` to reach a terminal
/// deployment phase (seconds)
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 600;

/// Fixed poll interval for status waits (milliseconds)
/// Waits are polling-with-timeout against the resource store, never a tight spin
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Namespace hosting capabilities resolved at CLUSTER scope
pub const DEFAULT_CLUSTER_CAPABILITY_NAMESPACE: &str = "capability-system";

/// Suffix appended to a capability name to derive its Service name
/// Load-bearing for downstream lookups - must match what deployment controllers create
pub const SERVICE_SUFFIX: &str = "-service";

/// Suffix appended to a capability name to derive its admin Secret name
pub const ADMIN_SECRET_SUFFIX: &str = "-admin-secret";

/// Qualifier under which deployment controllers record the primary server status
pub const MAIN_QUALIFIER: &str = "main";

/// Secret key holding the admin username
pub const USERNAME_KEY: &str = "username";

/// Secret key holding the admin password
pub const PASSWORD_KEY: &str = "password";

/// Label recording the owning resource's kind on a created capability
pub const OWNER_KIND_LABEL: &str = "capabilities.platform.io/owner-kind";

/// Label recording the owning resource's name on a created capability
pub const OWNER_NAME_LABEL: &str = "capabilities.platform.io/owner-name";

/// Annotation recording the owning resource's UID on a created capability
pub const OWNER_UID_ANNOTATION: &str = "capabilities.platform.io/owner-uid";
