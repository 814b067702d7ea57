use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::{Items, StorageBackend};
use crate::errors::StorageError;

/// Generic JSON file-backed map store.
///
/// Persists a `BTreeMap<String, V>` to a JSON file and rewrites the whole file
/// after every mutation. Intended for small local state where a database is overkill.
pub struct JsonMapStore<V> {
    inner: RwLock<BTreeMap<String, V>>,
    file_path: PathBuf,
}

/// File-backed storage area holding raw JSON values.
pub type JsonFileBackend = JsonMapStore<Value>;

impl<V> JsonMapStore<V>
where
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
{
    /// Open the store at `path`. Creates the file with an empty map if missing;
    /// an unreadable or corrupt file is an error rather than an empty map.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StorageError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }

        let map: BTreeMap<String, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: BTreeMap<String, V> = BTreeMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(|e| StorageError::Serialization(e.to_string()))?)
                    .await
                    .map_err(|e| StorageError::Io(e.to_string()))?;
                empty
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };
        debug!(path = %file_path.display(), entries = map.len(), "json map store opened");

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    async fn save(&self, map: &BTreeMap<String, V>) -> Result<(), StorageError> {
        let data = serde_json::to_vec(map).map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.file_path, data).await.map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    /// Read-only access to the current map.
    pub async fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, V>) -> R) -> R {
        let map = self.inner.read().await;
        f(&map)
    }

    /// Apply a mutation to a copy of the map, persist it, and only then publish it.
    ///
    /// A failed save leaves the in-memory map untouched. The write lock is held
    /// across the file write so saves land in mutation order.
    pub async fn update_map<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, V>),
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        f(&mut next);
        self.save(&next).await?;
        *map = next;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for JsonMapStore<Value> {
    async fn get(&self, keys: &[String]) -> Result<Items, StorageError> {
        Ok(self
            .read(|map| keys.iter().filter_map(|k| map.get(k).map(|v| (k.clone(), v.clone()))).collect())
            .await)
    }

    async fn get_all(&self) -> Result<Items, StorageError> {
        Ok(self.read(|map| map.clone()).await)
    }

    async fn set(&self, items: Items) -> Result<(), StorageError> {
        self.update_map(|map| map.extend(items)).await
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        self.update_map(|map| {
            for k in keys {
                map.remove(k);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonFileBackend::new(&tmp).await?;

        // initially empty
        assert!(store.get_all().await?.is_empty());

        store
            .set(Items::from([("a".to_string(), json!("1")), ("b".to_string(), json!({ "n": 2 }))]))
            .await?;
        assert_eq!(store.get(&["a".to_string()]).await?["a"], json!("1"));

        // overwrite replaces the whole value
        store.set(Items::from([("b".to_string(), json!({ "m": 3 }))])).await?;

        // remove and reload from disk
        store.remove(&["a".to_string()]).await?;
        let reloaded = JsonFileBackend::new(&tmp).await?;
        let entries = reloaded.get_all().await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["b"], json!({ "m": 3 }));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_save_leaves_map_unchanged() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonFileBackend::new(&tmp).await?;
        store.set(Items::from([("kept".to_string(), json!(0))])).await?;

        // a directory at the file path makes every later write fail
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;

        let res = store.set(Items::from([("k".to_string(), json!(1))])).await;
        assert!(matches!(res, Err(StorageError::Io(_))));
        assert!(store.get(&["k".to_string()]).await?.is_empty());

        let res = store.remove(&["kept".to_string()]).await;
        assert!(res.is_err());
        assert_eq!(store.get_all().await?, Items::from([("kept".to_string(), json!(0))]));

        let _ = tokio::fs::remove_dir(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        tokio::fs::write(&tmp, b"{not json").await?;

        let res = JsonFileBackend::new(&tmp).await;
        assert!(matches!(res, Err(StorageError::Serialization(_))));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
