use std::collections::BTreeMap;
use std::sync::Arc;

use models::{ContainerState, TabSnapshot};
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, instrument, warn};

use super::errors::IdentityError;
use super::locks::ContainerLocks;
use super::storage_area::{identifier_from_key, uuid_of, StorageArea};
use super::uuid_gen::new_uuid;
use crate::policy::UrlPolicy;
use crate::storage::StorageBackend;
use crate::tabs::TabQuery;

/// Identity service tuning
#[derive(Debug, Clone, Default)]
pub struct IdentityOptions {
    /// Serialize read-modify-write operations per container.
    /// Off by default: overlapping writers on one container may lose appends.
    pub serialize_writes: bool,
    /// Maintain an identifier/UUID index instead of scanning the whole area.
    pub secondary_index: bool,
    /// Keep at most this many archived tabs per container, dropping the oldest.
    pub max_hidden_tabs: Option<usize>,
}

/// Identity business service independent of the host environment.
///
/// Holds no state of its own beyond the injected collaborators; all records
/// live in the backend.
pub struct IdentityState<B: ?Sized, T: ?Sized, P> {
    storage: StorageArea<B>,
    tabs: Arc<T>,
    policy: P,
    max_hidden_tabs: Option<usize>,
    locks: Option<ContainerLocks>,
}

impl<B, T, P> IdentityState<B, T, P>
where
    B: StorageBackend + ?Sized,
    T: TabQuery + ?Sized,
    P: UrlPolicy,
{
    pub fn new(backend: Arc<B>, tabs: Arc<T>, policy: P, opts: IdentityOptions) -> Self {
        let storage = if opts.secondary_index { StorageArea::with_index(backend) } else { StorageArea::new(backend) };
        Self {
            storage,
            tabs,
            policy,
            max_hidden_tabs: opts.max_hidden_tabs,
            locks: opts.serialize_writes.then(ContainerLocks::new),
        }
    }

    pub fn storage(&self) -> &StorageArea<B> {
        &self.storage
    }

    async fn write_guard(&self, container_id: &str) -> Option<OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(container_id).await),
            None => None,
        }
    }

    /// Current record for a container, created on first access.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::identity::{IdentityOptions, IdentityState};
    /// use service::policy::SchemePolicy;
    /// use service::storage::MemoryBackend;
    /// use service::tabs::StaticTabs;
    /// let svc = IdentityState::new(Arc::new(MemoryBackend::new()), Arc::new(StaticTabs::new()), SchemePolicy::default(), IdentityOptions::default());
    /// let state = tokio_test::block_on(svc.container_state("firefox-container-1")).unwrap();
    /// assert!(state.hidden_tabs.is_empty());
    /// assert_eq!(state.mac_addon_uuid.len(), 36);
    /// ```
    #[instrument(skip(self))]
    pub async fn container_state(&self, container_id: &str) -> Result<ContainerState, IdentityError> {
        self.storage.get(container_id).await
    }

    /// Identifier -> UUID for every container record in the area.
    ///
    /// Without the index this reads every backend key, not just identity records.
    #[instrument(skip(self))]
    pub async fn map_of_identifier_to_uuid(&self) -> Result<BTreeMap<String, String>, IdentityError> {
        if let Some(index) = self.storage.index().await? {
            return Ok(index.identifier_map().await);
        }

        let mut containers = BTreeMap::new();
        for (key, value) in self.storage.scan().await? {
            match uuid_of(&value) {
                Some(uuid) => {
                    containers.insert(identifier_from_key(&key).to_string(), uuid.to_string());
                }
                None => warn!(%key, "container record without macAddonUUID skipped"),
            }
        }
        Ok(containers)
    }

    /// Archive the permissible tabs of `container_id` in `window_id`.
    ///
    /// Each archived tab is stored as inactive with `hiddenState = true`.
    /// Tabs already in the archive are not deduplicated. Returns how many were added.
    #[instrument(skip(self))]
    pub async fn archive_hidden_tabs(&self, container_id: &str, window_id: i64) -> Result<usize, IdentityError> {
        let _guard = self.write_guard(container_id).await;
        let mut state = self.storage.get(container_id).await?;
        let tabs = self.tabs.query(container_id, window_id).await?;

        let snapshots: Vec<TabSnapshot> = tabs
            .iter()
            .filter(|tab| self.policy.is_permissible(&tab.url))
            .map(TabSnapshot::capture)
            .collect();
        let archived = snapshots.len();
        state.archive(snapshots, self.max_hidden_tabs);

        self.storage.set(container_id, &state).await?;
        info!(archived, skipped = tabs.len() - archived, archive_len = state.hidden_tabs.len(), "hidden tabs archived");
        Ok(archived)
    }

    /// Replace the UUID of a container.
    ///
    /// Both arguments must be non-empty; the check happens before any storage access.
    #[instrument(skip(self))]
    pub async fn assign_uuid(&self, container_id: &str, uuid: &str) -> Result<(), IdentityError> {
        if container_id.is_empty() || uuid.is_empty() {
            return Err(IdentityError::InvalidArgument("container id or uuid missing".into()));
        }

        let _guard = self.write_guard(container_id).await;
        let mut state = self.storage.get(container_id).await?;
        state.mac_addon_uuid = uuid.to_string();
        self.storage.set(container_id, &state).await?;
        info!("uuid assigned");
        Ok(())
    }

    /// Assign a freshly generated UUID and return it.
    pub async fn add_new_uuid(&self, container_id: &str) -> Result<String, IdentityError> {
        let uuid = new_uuid();
        self.assign_uuid(container_id, &uuid).await?;
        Ok(uuid)
    }

    /// UUID lookup by container identifier.
    ///
    /// Matches a record only when the stored value itself equals the identifier
    /// string. Container records are objects, so for well-formed data this is
    /// always `None`; kept for parity with existing callers.
    #[instrument(skip(self))]
    pub async fn lookup_uuid_by_identifier(&self, container_id: &str) -> Result<Option<String>, IdentityError> {
        for (_, value) in self.storage.scan().await? {
            if value.as_str() == Some(container_id) {
                return Ok(value.get("macAddonUUID").and_then(Value::as_str).map(str::to_string));
            }
        }
        Ok(None)
    }

    /// Container identifier holding `uuid`; the first match in key order wins.
    #[instrument(skip(self))]
    pub async fn lookup_identifier_by_uuid(&self, uuid: &str) -> Result<Option<String>, IdentityError> {
        if let Some(index) = self.storage.index().await? {
            return Ok(index.identifier_for(uuid).await);
        }

        for (key, value) in self.storage.scan().await? {
            if uuid_of(&value) == Some(uuid) {
                return Ok(Some(identifier_from_key(&key).to_string()));
            }
        }
        Ok(None)
    }

    /// Delete the record of a container. The next read recreates a default one.
    ///
    /// With serialized writes the container's mutex is released as well.
    #[instrument(skip(self))]
    pub async fn forget(&self, container_id: &str) -> Result<(), IdentityError> {
        let guard = self.write_guard(container_id).await;
        let removed = self.storage.remove(container_id).await;
        drop(guard);
        if let Some(locks) = &self.locks {
            locks.release(container_id);
        }
        removed?;
        info!("container state forgotten");
        Ok(())
    }

    /// Number of containers currently tracked for write serialization.
    pub fn tracked_locks(&self) -> usize {
        self.locks.as_ref().map_or(0, ContainerLocks::len)
    }
}
