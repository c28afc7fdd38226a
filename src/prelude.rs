//! # Prelude
//!
//! Re-exports commonly used types for convenience.
//!
//! ```rust
//! use capability_controller::prelude::*;
//! ```

pub use crate::config::OperatorConfig;
pub use crate::connection::{DatabaseConnectionInfo, SsoConnectionInfo};
pub use crate::crd::*;
pub use crate::error::CapabilityError;
pub use crate::matcher::{CandidateLocation, MatchOutcome};
pub use crate::provisioning::{
    CapabilityProvider, CapabilityProvisioningResult, ProvisioningTimeouts,
};
pub use crate::store::{CapabilityStore, InMemoryCapabilityStore, KubeCapabilityStore};
