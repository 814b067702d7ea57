use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Items, StorageBackend};
use crate::errors::StorageError;

/// In-process storage area. Used by tests and by embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<Items>,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }

    /// Seed the area with existing entries.
    pub fn with_items(items: Items) -> Self {
        Self { inner: RwLock::new(items) }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, keys: &[String]) -> Result<Items, StorageError> {
        let map = self.inner.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| map.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn get_all(&self) -> Result<Items, StorageError> {
        Ok(self.inner.read().await.clone())
    }

    async fn set(&self, items: Items) -> Result<(), StorageError> {
        self.inner.write().await.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut map = self.inner.write().await;
        for k in keys {
            map.remove(k);
        }
        Ok(())
    }
}
