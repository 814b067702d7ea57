//! Secondary identifier <-> UUID index.
//!
//! Answers the same questions as a full scan of the storage area, in the same
//! order, without reading every backend key. It is filled by one scan on first
//! use and then updated by every write that goes through `StorageArea`.
//! Writes made to the backend behind the adapter's back are not observed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tokio::sync::RwLock;
use tracing::debug;

use super::storage_area::{identifier_from_key, is_namespaced, uuid_of};
use crate::errors::StorageError;
use crate::storage::StorageBackend;

#[derive(Default)]
struct Entries {
    // keyed by full storage key so ordering matches a scan
    uuid_by_key: BTreeMap<String, String>,
    keys_by_uuid: HashMap<String, BTreeSet<String>>,
}

impl Entries {
    fn insert(&mut self, key: String, uuid: String) {
        if let Some(old) = self.uuid_by_key.insert(key.clone(), uuid.clone()) {
            self.unlink(&old, &key);
        }
        self.keys_by_uuid.entry(uuid).or_default().insert(key);
    }

    fn remove(&mut self, key: &str) {
        if let Some(old) = self.uuid_by_key.remove(key) {
            self.unlink(&old, key);
        }
    }

    fn unlink(&mut self, uuid: &str, key: &str) {
        if let Some(keys) = self.keys_by_uuid.get_mut(uuid) {
            keys.remove(key);
            if keys.is_empty() {
                self.keys_by_uuid.remove(uuid);
            }
        }
    }
}

#[derive(Default)]
pub struct IdentityIndex {
    entries: RwLock<Option<Entries>>,
}

impl IdentityIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn is_loaded(&self) -> bool {
        self.entries.read().await.is_some()
    }

    /// Build from a full scan unless already built.
    ///
    /// The write lock is held across the scan so concurrent `record`/`forget`
    /// calls apply after the build instead of being lost.
    pub async fn ensure_loaded<B>(&self, backend: &B) -> Result<(), StorageError>
    where
        B: StorageBackend + ?Sized,
    {
        if self.is_loaded().await {
            return Ok(());
        }
        let mut guard = self.entries.write().await;
        if guard.is_some() {
            return Ok(());
        }
        let mut entries = Entries::default();
        for (key, value) in backend.get_all().await? {
            if !is_namespaced(&key) {
                continue;
            }
            if let Some(uuid) = uuid_of(&value) {
                let uuid = uuid.to_string();
                entries.insert(key, uuid);
            }
        }
        debug!(entries = entries.uuid_by_key.len(), "identity index built");
        *guard = Some(entries);
        Ok(())
    }

    /// Note a write of `uuid` under `key`. No-op until the index is built.
    pub async fn record(&self, key: &str, uuid: &str) {
        if let Some(entries) = self.entries.write().await.as_mut() {
            entries.insert(key.to_string(), uuid.to_string());
        }
    }

    /// Note the removal of `key`. No-op until the index is built.
    pub async fn forget(&self, key: &str) {
        if let Some(entries) = self.entries.write().await.as_mut() {
            entries.remove(key);
        }
    }

    /// Identifier -> UUID for every indexed record.
    pub async fn identifier_map(&self) -> BTreeMap<String, String> {
        let guard = self.entries.read().await;
        let Some(entries) = guard.as_ref() else { return BTreeMap::new() };
        entries
            .uuid_by_key
            .iter()
            .map(|(key, uuid)| (identifier_from_key(key).to_string(), uuid.clone()))
            .collect()
    }

    /// Identifier of the first record (in key order) holding `uuid`.
    pub async fn identifier_for(&self, uuid: &str) -> Option<String> {
        let guard = self.entries.read().await;
        let key = guard.as_ref()?.keys_by_uuid.get(uuid)?.iter().next()?;
        Some(identifier_from_key(key).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Items, MemoryBackend};
    use serde_json::json;

    #[tokio::test]
    async fn build_then_track_writes() -> Result<(), anyhow::Error> {
        let backend = MemoryBackend::with_items(Items::from([
            ("identitiesState@@_b".to_string(), json!({ "hiddenTabs": [], "macAddonUUID": "u-b" })),
            ("identitiesState@@_a".to_string(), json!({ "hiddenTabs": [], "macAddonUUID": "u-shared" })),
            ("identitiesState@@_c".to_string(), json!({ "hiddenTabs": [], "macAddonUUID": "u-shared" })),
            ("other".to_string(), json!({ "macAddonUUID": "u-other" })),
        ]));
        let index = IdentityIndex::new();

        // writes before the build are ignored; the build picks them up from the backend
        index.record("identitiesState@@_z", "u-z").await;
        assert!(!index.is_loaded().await);

        index.ensure_loaded(&backend).await?;
        assert_eq!(index.identifier_map().await.len(), 3);
        assert_eq!(index.identifier_for("u-shared").await.as_deref(), Some("a"));
        assert_eq!(index.identifier_for("u-other").await, None);

        // re-pointing a key drops its old uuid
        index.record("identitiesState@@_a", "u-a2").await;
        assert_eq!(index.identifier_for("u-shared").await.as_deref(), Some("c"));
        assert_eq!(index.identifier_for("u-a2").await.as_deref(), Some("a"));

        index.forget("identitiesState@@_c").await;
        assert_eq!(index.identifier_for("u-shared").await, None);
        Ok(())
    }
}
