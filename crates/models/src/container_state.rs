use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::tab::TabSnapshot;

/// Persisted state of a single container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerState {
    /// Append-only archive of tabs captured when the container was hidden.
    #[serde(rename = "hiddenTabs", default)]
    pub hidden_tabs: Vec<TabSnapshot>,
    /// Stable identifier shared with the companion add-on.
    #[serde(rename = "macAddonUUID")]
    pub mac_addon_uuid: String,
}

impl ContainerState {
    /// Fresh record with an empty archive.
    pub fn new(mac_addon_uuid: impl Into<String>) -> Self {
        Self { hidden_tabs: Vec::new(), mac_addon_uuid: mac_addon_uuid.into() }
    }

    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        Self::deserialize(value).map_err(|e| ModelError::Decode(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Encode(e.to_string()))
    }

    /// Append snapshots in order. With `limit`, the oldest entries are
    /// evicted so that at most `limit` remain.
    pub fn archive<I>(&mut self, snapshots: I, limit: Option<usize>)
    where
        I: IntoIterator<Item = TabSnapshot>,
    {
        self.hidden_tabs.extend(snapshots);
        if let Some(limit) = limit {
            let len = self.hidden_tabs.len();
            if len > limit {
                self.hidden_tabs.drain(..len - limit);
            }
        }
    }
}
