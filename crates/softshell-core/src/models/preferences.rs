//! Per-site persisted model preferences.
//!
//! One JSON document under the `"model-preferences"` storage key maps each
//! site endpoint to its server-pushed defaults and the user's explicit
//! selections, keyed by usage category.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::ModelUsage;

/// The single storage key covering all known sites.
pub const MODEL_PREFERENCES_KEY: &str = "model-preferences";

/// Endpoint → preferences for that site.
pub type PerSitePreferences = HashMap<String, SitePreferences>;

/// Defaults and selections for one site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePreferences {
    /// Server-pushed defaults; overwritten on every server configuration.
    #[serde(default)]
    pub defaults: UsageModelMap,
    /// The user's explicit selections; survive server default changes.
    #[serde(default)]
    pub selected: UsageModelMap,
}

/// Model id per usage category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageModelMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
}

impl UsageModelMap {
    pub fn get(&self, usage: ModelUsage) -> Option<&str> {
        match usage {
            ModelUsage::Chat => self.chat.as_deref(),
            ModelUsage::Edit => self.edit.as_deref(),
            ModelUsage::Autocomplete => self.autocomplete.as_deref(),
        }
    }

    pub fn set(&mut self, usage: ModelUsage, model_id: impl Into<String>) {
        let slot = match usage {
            ModelUsage::Chat => &mut self.chat,
            ModelUsage::Edit => &mut self.edit,
            ModelUsage::Autocomplete => &mut self.autocomplete,
        };
        *slot = Some(model_id.into());
    }

    pub fn remove(&mut self, usage: ModelUsage) {
        match usage {
            ModelUsage::Chat => self.chat = None,
            ModelUsage::Edit => self.edit = None,
            ModelUsage::Autocomplete => self.autocomplete = None,
        }
    }

    /// Drop every entry whose model id fails the predicate.
    pub fn retain_ids(&mut self, mut keep: impl FnMut(&str) -> bool) {
        for usage in [ModelUsage::Chat, ModelUsage::Edit, ModelUsage::Autocomplete] {
            if self.get(usage).is_some_and(|id| !keep(id)) {
                self.remove(usage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_map_accessors() {
        let mut map = UsageModelMap::default();
        assert!(map.get(ModelUsage::Chat).is_none());
        map.set(ModelUsage::Chat, "model-1");
        map.set(ModelUsage::Edit, "model-2");
        assert_eq!(map.get(ModelUsage::Chat), Some("model-1"));
        assert_eq!(map.get(ModelUsage::Edit), Some("model-2"));
        map.remove(ModelUsage::Chat);
        assert!(map.get(ModelUsage::Chat).is_none());
    }

    #[test]
    fn test_retain_drops_withdrawn_ids() {
        let mut map = UsageModelMap::default();
        map.set(ModelUsage::Chat, "kept");
        map.set(ModelUsage::Autocomplete, "withdrawn");
        map.retain_ids(|id| id == "kept");
        assert_eq!(map.get(ModelUsage::Chat), Some("kept"));
        assert!(map.get(ModelUsage::Autocomplete).is_none());
    }

    #[test]
    fn test_persisted_layout() {
        let mut prefs = PerSitePreferences::new();
        let mut site = SitePreferences::default();
        site.defaults.set(ModelUsage::Chat, "opus");
        site.selected.set(ModelUsage::Chat, "titan");
        prefs.insert("https://example.com".to_string(), site);

        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["https://example.com"]["defaults"]["chat"], "opus");
        assert_eq!(json["https://example.com"]["selected"]["chat"], "titan");
        // Unset usages are omitted entirely.
        assert!(json["https://example.com"]["defaults"].get("edit").is_none());
    }
}
