//! # Capability Controller Library
//!
//! Resolves abstract capability requirements (a MySQL database, an SSO
//! server) into concrete, reusable `ProvidedCapability` resources, and tracks
//! their asynchronous provisioning by out-of-process deployment controllers
//! through status alone.
//!
//! ## Module Structure
//!
//! - `crd` - the `ProvidedCapability` resource, requirements, status ledger
//! - `naming` - deterministic resource names per capability kind and scope
//! - `matcher` - reuse/create/conflict decisions over existing capabilities
//! - `store` - the cluster resource store seam (Kubernetes and in-memory)
//! - `provisioning` - the state machine with its bounded waits
//! - `connection` - database and SSO connection-info adapters
//! - `config` - immutable operator configuration

pub mod config;
pub mod connection;
pub mod constants;
pub mod crd;
pub mod error;
pub mod matcher;
pub mod naming;
pub mod prelude;
pub mod provisioning;
pub mod store;
