use std::collections::HashMap;

use async_trait::async_trait;
use models::TabDescriptor;
use tokio::sync::RwLock;

use crate::errors::TabQueryError;

/// Host tab service: lists the tabs open in a container within one window.
#[async_trait]
pub trait TabQuery: Send + Sync {
    async fn query(&self, container_id: &str, window_id: i64) -> Result<Vec<TabDescriptor>, TabQueryError>;
}

/// Fixed tab listing keyed by `(container, window)`.
/// Backs tests and offline tooling where no live browser is attached.
#[derive(Default)]
pub struct StaticTabs {
    tabs: RwLock<HashMap<(String, i64), Vec<TabDescriptor>>>,
}

impl StaticTabs {
    pub fn new() -> Self { Self::default() }

    /// Replace the tabs reported for `(container_id, window_id)`.
    pub async fn put(&self, container_id: &str, window_id: i64, tabs: Vec<TabDescriptor>) {
        self.tabs.write().await.insert((container_id.to_string(), window_id), tabs);
    }
}

#[async_trait]
impl TabQuery for StaticTabs {
    async fn query(&self, container_id: &str, window_id: i64) -> Result<Vec<TabDescriptor>, TabQueryError> {
        let tabs = self.tabs.read().await;
        Ok(tabs.get(&(container_id.to_string(), window_id)).cloned().unwrap_or_default())
    }
}
