//! Namespaced access to container records in the shared storage area.

use std::sync::Arc;

use models::ContainerState;
use serde_json::Value;
use tracing::{debug, info};

use super::errors::IdentityError;
use super::index::IdentityIndex;
use super::uuid_gen::new_uuid;
use crate::storage::{Items, StorageBackend};

/// Prefix shared by every container record key.
pub const KEY_PREFIX: &str = "identitiesState@@_";

/// Storage key for a container. Identifiers are not escaped.
pub fn key_for(container_id: &str) -> String {
    format!("{KEY_PREFIX}{container_id}")
}

/// Scans select any key containing the prefix, not only keys starting with it.
pub fn is_namespaced(key: &str) -> bool {
    key.contains(KEY_PREFIX)
}

/// Strip a leading prefix; keys that merely contain it come back whole.
pub fn identifier_from_key(key: &str) -> &str {
    key.strip_prefix(KEY_PREFIX).unwrap_or(key)
}

/// `macAddonUUID` of a raw stored value, if it holds a string one.
pub fn uuid_of(value: &Value) -> Option<&str> {
    value.get("macAddonUUID").and_then(Value::as_str)
}

/// Outcome of a read that may have materialized a default record.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    Existed(ContainerState),
    Created(ContainerState),
}

impl Materialized {
    pub fn was_created(&self) -> bool {
        matches!(self, Materialized::Created(_))
    }

    pub fn state(&self) -> &ContainerState {
        match self {
            Materialized::Existed(s) | Materialized::Created(s) => s,
        }
    }

    pub fn into_state(self) -> ContainerState {
        match self {
            Materialized::Existed(s) | Materialized::Created(s) => s,
        }
    }
}

/// Storage adapter: one record per container under a prefixed key.
pub struct StorageArea<B: ?Sized> {
    backend: Arc<B>,
    index: Option<IdentityIndex>,
}

impl<B: StorageBackend + ?Sized> StorageArea<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend, index: None }
    }

    /// Adapter that also maintains a secondary identifier/UUID index.
    pub fn with_index(backend: Arc<B>) -> Self {
        Self { backend, index: Some(IdentityIndex::new()) }
    }

    /// Read a record, creating and persisting a default one when absent.
    pub async fn get_or_create(&self, container_id: &str) -> Result<Materialized, IdentityError> {
        let key = key_for(container_id);
        let mut found = self.backend.get(std::slice::from_ref(&key)).await?;
        if let Some(value) = found.remove(&key) {
            debug!(%key, "container state loaded");
            return Ok(Materialized::Existed(ContainerState::from_value(&value)?));
        }

        let state = ContainerState::new(new_uuid());
        self.set(container_id, &state).await?;
        info!(container_id, uuid = %state.mac_addon_uuid, "container state created");
        Ok(Materialized::Created(state))
    }

    pub async fn get(&self, container_id: &str) -> Result<ContainerState, IdentityError> {
        Ok(self.get_or_create(container_id).await?.into_state())
    }

    /// Overwrite the whole record; there is no field-level merge.
    pub async fn set(&self, container_id: &str, state: &ContainerState) -> Result<(), IdentityError> {
        let key = key_for(container_id);
        let value = state.to_value()?;
        self.backend.set(Items::from([(key.clone(), value)])).await?;
        if let Some(index) = &self.index {
            index.record(&key, &state.mac_addon_uuid).await;
        }
        debug!(%key, hidden_tabs = state.hidden_tabs.len(), "container state stored");
        Ok(())
    }

    pub async fn remove(&self, container_id: &str) -> Result<(), IdentityError> {
        let key = key_for(container_id);
        self.backend.remove(std::slice::from_ref(&key)).await?;
        if let Some(index) = &self.index {
            index.forget(&key).await;
        }
        debug!(%key, "container state removed");
        Ok(())
    }

    /// Every namespaced `(key, raw value)` in backend key order.
    pub async fn scan(&self) -> Result<Vec<(String, Value)>, IdentityError> {
        let all = self.backend.get_all().await?;
        Ok(all.into_iter().filter(|(k, _)| is_namespaced(k)).collect())
    }

    /// The secondary index, built on first access. `None` when not configured.
    pub async fn index(&self) -> Result<Option<&IdentityIndex>, IdentityError> {
        match &self.index {
            Some(index) => {
                index.ensure_loaded(self.backend.as_ref()).await?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }
}
