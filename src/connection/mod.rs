//! # Connection Info Adapters
//!
//! Strongly-typed, read-only views over a completed provisioning result.
//! Adapters tolerate both DEPLOY_DIRECTLY and USE_EXTERNAL provenance; a
//! caller can only tell the difference through the field values themselves.

mod database;
mod sso;

pub use database::DatabaseConnectionInfo;
pub use sso::SsoConnectionInfo;

use k8s_openapi::api::core::v1::Secret;

/// Read a key from a Secret, preferring `stringData` (used by the in-memory
/// store and freshly written secrets) over the binary `data` map.
pub(crate) fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    if let Some(value) = secret.string_data.as_ref().and_then(|map| map.get(key)) {
        return Some(value.clone());
    }
    secret
        .data
        .as_ref()
        .and_then(|map| map.get(key))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
}
