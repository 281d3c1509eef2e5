//! Wire format of the server's model configuration.
//!
//! Enterprise servers publish their model catalog and per-usage defaults as a
//! JSON document. Model references are `provider::api-version::model-name`
//! triples; [`ModelRef`] parses them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The server's complete model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerModelConfiguration {
    pub schema_version: String,
    pub revision: String,
    #[serde(default)]
    pub providers: Vec<ServerProvider>,
    pub models: Vec<ServerModel>,
    pub default_models: ServerDefaultModels,
}

/// A provider entry in the server catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProvider {
    pub id: String,
    pub display_name: String,
}

/// Per-usage default model references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefaultModels {
    pub chat: String,
    pub fast_chat: String,
    pub code_completion: String,
}

/// One model descriptor in the server catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerModel {
    pub model_ref: String,
    pub display_name: String,
    pub model_name: String,
    pub capabilities: Vec<ModelCapability>,
    pub category: ModelCategory,
    pub status: ModelStatus,
    pub tier: ModelTier,
    pub context_window: ServerContextWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContextWindow {
    pub max_input_tokens: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCapability {
    Chat,
    Edit,
    Autocomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Accuracy,
    Balanced,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Stable,
    Beta,
    Experimental,
    Deprecated,
    Waitlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Free,
    Pro,
    Enterprise,
}

/// A parsed `provider::api-version::model-name` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub provider: String,
    pub api_version: String,
    pub name: String,
}

/// Error for a reference that is not a `::`-separated triple.
#[derive(Debug, thiserror::Error)]
#[error("malformed model ref {0:?} (expected provider::api-version::model-name)")]
pub struct InvalidModelRef(pub String);

impl FromStr for ModelRef {
    type Err = InvalidModelRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, "::");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(provider), Some(api_version), Some(name))
                if !provider.is_empty() && !name.is_empty() =>
            {
                Ok(Self {
                    provider: provider.to_string(),
                    api_version: api_version.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(InvalidModelRef(s.to_string())),
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.provider, self.api_version, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ref_parse() {
        let parsed: ModelRef = "anthropic::unknown::anthropic.claude-3-opus-20240229-v1_0"
            .parse()
            .unwrap();
        assert_eq!(parsed.provider, "anthropic");
        assert_eq!(parsed.api_version, "unknown");
        assert_eq!(parsed.name, "anthropic.claude-3-opus-20240229-v1_0");
    }

    #[test]
    fn test_model_ref_rejects_malformed() {
        assert!("just-a-name".parse::<ModelRef>().is_err());
        assert!("a::b".parse::<ModelRef>().is_err());
        assert!("::v1::name".parse::<ModelRef>().is_err());
    }

    #[test]
    fn test_configuration_wire_format() {
        let json = r#"{
            "schemaVersion": "1.0",
            "revision": "-",
            "providers": [],
            "models": [{
                "modelRef": "anthropic::unknown::anthropic.claude-instant-v1",
                "displayName": "Instant",
                "modelName": "anthropic.claude-instant-v1",
                "capabilities": ["autocomplete"],
                "category": "balanced",
                "status": "stable",
                "tier": "enterprise",
                "contextWindow": { "maxInputTokens": 9000, "maxOutputTokens": 4000 }
            }],
            "defaultModels": {
                "chat": "anthropic::unknown::anthropic.claude-instant-v1",
                "fastChat": "anthropic::unknown::anthropic.claude-instant-v1",
                "codeCompletion": "anthropic::unknown::anthropic.claude-instant-v1"
            }
        }"#;
        let config: ServerModelConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].capabilities, vec![ModelCapability::Autocomplete]);
        assert_eq!(config.models[0].tier, ModelTier::Enterprise);
        assert_eq!(config.models[0].context_window.max_input_tokens, 9000);
    }
}
