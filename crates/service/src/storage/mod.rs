//! Storage abstractions for the identity layer.
//!
//! The backend mirrors a browser extension's local storage area: string keys,
//! JSON values, batch get/set/remove and a whole-area read used by scans.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StorageError;

pub mod json_map_store;
pub mod memory;

pub use json_map_store::{JsonFileBackend, JsonMapStore};
pub use memory::MemoryBackend;

/// Ordered snapshot of backend entries.
pub type Items = BTreeMap<String, Value>;

/// Trait abstraction for the shared key-value area.
/// Implementations can be in-memory, file-backed, or bridged to a host API.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[String]) -> Result<Items, StorageError>;
    /// Fetch every entry in the area, ordered by key.
    async fn get_all(&self) -> Result<Items, StorageError>;
    /// Upsert all entries.
    async fn set(&self, items: Items) -> Result<(), StorageError>;
    /// Delete the given keys; missing keys are ignored.
    async fn remove(&self, keys: &[String]) -> Result<(), StorageError>;
}
