use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tab as reported by the host's tab service.
///
/// Only `url` and `active` are interpreted; every other field is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabDescriptor {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TabDescriptor {
    pub fn new(url: impl Into<String>, active: bool) -> Self {
        Self { url: url.into(), active, extra: Map::new() }
    }

    /// Builder-style helper for attaching an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Archived copy of a tab taken when its container was hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabSnapshot {
    #[serde(flatten)]
    pub tab: TabDescriptor,
    #[serde(rename = "hiddenState", default)]
    pub hidden_state: bool,
}

impl TabSnapshot {
    /// Shallow copy of `tab` with `active = false` and `hiddenState = true`.
    pub fn capture(tab: &TabDescriptor) -> Self {
        let mut tab = tab.clone();
        tab.active = false;
        // hiddenState is owned by the snapshot; a stale copy in extra would serialize twice
        tab.extra.remove("hiddenState");
        Self { tab, hidden_state: true }
    }

    pub fn url(&self) -> &str {
        &self.tab.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn capture_overrides_only_active_and_hidden_state() {
        let tab = TabDescriptor::new("https://a.example", true)
            .with_field("id", 7)
            .with_field("title", "A")
            .with_field("pinned", true);

        let snap = TabSnapshot::capture(&tab);
        assert!(!snap.tab.active);
        assert!(snap.hidden_state);
        assert_eq!(snap.url(), "https://a.example");
        assert_eq!(snap.tab.extra, tab.extra);
    }

    #[test]
    fn snapshot_serializes_flat() -> Result<(), anyhow::Error> {
        let tab = TabDescriptor::new("https://a.example", true).with_field("windowId", 3);
        let value = serde_json::to_value(TabSnapshot::capture(&tab))?;
        assert_eq!(
            value,
            json!({ "url": "https://a.example", "active": false, "hiddenState": true, "windowId": 3 })
        );
        Ok(())
    }

    #[test]
    fn snapshot_decodes_host_layout() -> Result<(), anyhow::Error> {
        let raw = json!({
            "url": "https://b.example",
            "active": false,
            "hiddenState": true,
            "cookieStoreId": "firefox-container-1",
            "index": 4
        });
        let snap: TabSnapshot = serde_json::from_value(raw)?;
        assert!(snap.hidden_state);
        assert_eq!(snap.tab.extra.get("index"), Some(&json!(4)));
        assert!(!snap.tab.extra.contains_key("hiddenState"));
        Ok(())
    }

    #[test]
    fn capture_drops_stale_hidden_state_field() -> Result<(), anyhow::Error> {
        let tab = TabDescriptor::new("https://c.example", false).with_field("hiddenState", false);
        let value = serde_json::to_value(TabSnapshot::capture(&tab))?;
        assert_eq!(value["hiddenState"], json!(true));
        Ok(())
    }
}
