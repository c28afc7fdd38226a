//! # Error Types
//!
//! Library-level error type for capability resolution and provisioning.
//!
//! Note the split between *errors* and *failures*: transport and store faults
//! are `CapabilityError` and propagate with `?`. Validation problems, matcher
//! conflicts, deployment failures and timeouts are data - they travel as a
//! [`ControllerFailure`](crate::crd::ControllerFailure) inside results and
//! resource statuses and are never raised as Rust errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A cluster resource store operation failed (API server unreachable,
    /// forbidden, malformed response, ...).
    #[error("resource store operation failed: {0}")]
    Store(#[from] kube::Error),

    /// Status or spec (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else that should abort the current invocation.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
