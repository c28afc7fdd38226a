//! # Custom Resource Definitions
//!
//! CRD types for the capability controller.
//!
//! ## Module Structure
//!
//! - `capability.rs` - The `ProvidedCapability` resource and its vocabulary
//!   enums (kind, implementation, scope, provisioning strategy)
//! - `requirement.rs` - The transient `CapabilityRequirement` request object
//! - `status.rs` - Server status entries, controller failures and the
//!   deployment phase ledger

mod capability;
mod requirement;
mod status;

pub use capability::{
    CapabilityImplementation, CapabilityKind, CapabilityRequester, CapabilityScope,
    ExternallyProvidedService, ProvidedCapability, ProvidedCapabilitySpec, ProvisioningStrategy,
    ResourceReference,
};
pub use requirement::{CapabilityRequirement, CapabilityRequirementBuilder};
pub use status::{ControllerFailure, DeploymentPhase, ProvidedCapabilityStatus, ServerStatus};
