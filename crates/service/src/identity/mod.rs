//! Identity state: per-container records, hidden-tab archive and UUID lookups.
//!
//! Layers, leaves first:
//! - `uuid_gen` produces v4 identifiers.
//! - `storage_area` namespaces keys and lazily materializes default records.
//! - `service` holds the business operations on top of the adapter.

pub mod errors;
pub mod index;
pub mod locks;
pub mod service;
pub mod storage_area;
pub mod uuid_gen;

pub use errors::IdentityError;
pub use service::{IdentityOptions, IdentityState};
pub use storage_area::{key_for, Materialized, StorageArea, KEY_PREFIX};
