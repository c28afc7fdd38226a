//! # Capability Provisioning
//!
//! The status-driven state machine that turns a `CapabilityRequirement` into
//! a `CapabilityProvisioningResult`, coordinating with out-of-process
//! deployment controllers purely through `ProvidedCapability` status.
//!
//! ## Module Structure
//!
//! - `state_machine.rs` - resolve-or-create, delegate, bounded waits,
//!   terminal status translation
//! - `wait.rs` - polling-with-timeout against the resource store
//! - `result.rs` - the handoff object to connection-info adapters

mod result;
mod state_machine;
mod wait;

pub use result::CapabilityProvisioningResult;
pub use state_machine::{CapabilityProvider, ProvisioningTimeouts};
pub use wait::await_capability;
