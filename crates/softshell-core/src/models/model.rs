//! The internal model representation.
//!
//! A [`Model`] is immutable once constructed. It comes from either the
//! built-in catalog ([`super::dotcom`]) or a server-sent descriptor via
//! [`Model::from_api`].

use serde::{Deserialize, Serialize};

use super::server::{
    InvalidModelRef, ModelCapability, ModelCategory, ModelRef, ModelStatus, ModelTier, ServerModel,
};
use super::types::{ContextWindow, ModelTag, ModelUsage};

/// One entry in the model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Stable identifier, e.g. `anthropic/claude-3-5-sonnet-20240620`.
    pub id: String,
    /// Human-readable name shown in pickers.
    pub title: String,
    /// Provider namespace, e.g. `anthropic`.
    pub provider: String,
    /// Usage categories this model supports.
    pub usage: Vec<ModelUsage>,
    pub context_window: ContextWindow,
    pub tags: Vec<ModelTag>,
}

impl Model {
    /// Build a model with the default chat window, no tags, and id-derived
    /// title/provider. Use the `with_*` builders to refine.
    pub fn new(id: impl Into<String>, usage: Vec<ModelUsage>) -> Self {
        let id = id.into();
        let (provider, title) = match id.split_once('/') {
            Some((provider, name)) => (provider.to_string(), name.to_string()),
            None => (String::new(), id.clone()),
        };
        Self {
            id,
            title,
            provider,
            usage,
            context_window: ContextWindow::default_chat(),
            tags: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_context_window(mut self, context_window: ContextWindow) -> Self {
        self.context_window = context_window;
        self
    }

    pub fn with_tags(mut self, tags: Vec<ModelTag>) -> Self {
        self.tags = tags;
        self
    }

    /// Convert a server-sent descriptor. The provider is derived from the
    /// model-reference namespace; tier, category, and status map onto tags;
    /// the window comes from the declared token limits.
    pub fn from_api(server: &ServerModel) -> Result<Self, InvalidModelRef> {
        let model_ref: ModelRef = server.model_ref.parse()?;

        let mut usage = Vec::new();
        for capability in &server.capabilities {
            match capability {
                // Chat-capable models are also usable for edits.
                ModelCapability::Chat => {
                    usage.push(ModelUsage::Chat);
                    usage.push(ModelUsage::Edit);
                }
                ModelCapability::Edit => usage.push(ModelUsage::Edit),
                ModelCapability::Autocomplete => usage.push(ModelUsage::Autocomplete),
            }
        }
        usage.dedup();

        let mut tags = vec![match server.tier {
            ModelTier::Free => ModelTag::Free,
            ModelTier::Pro => ModelTag::Pro,
            ModelTier::Enterprise => ModelTag::Enterprise,
        }];
        tags.push(match server.category {
            ModelCategory::Accuracy => ModelTag::Power,
            ModelCategory::Balanced => ModelTag::Balanced,
            ModelCategory::Speed => ModelTag::Speed,
        });
        match server.status {
            ModelStatus::Stable | ModelStatus::Beta => {}
            ModelStatus::Experimental => tags.push(ModelTag::Experimental),
            ModelStatus::Deprecated => tags.push(ModelTag::Deprecated),
            ModelStatus::Waitlist => tags.push(ModelTag::Waitlist),
        }

        Ok(Self {
            id: server.model_name.clone(),
            title: server.display_name.clone(),
            provider: model_ref.provider,
            usage,
            context_window: ContextWindow {
                input: server.context_window.max_input_tokens,
                output: server.context_window.max_output_tokens,
                context: None,
            },
            tags,
        })
    }

    /// The model's access tier. Untagged models count as free.
    pub fn tier(&self) -> ModelTag {
        for tag in &self.tags {
            if matches!(tag, ModelTag::Free | ModelTag::Pro | ModelTag::Enterprise) {
                return *tag;
            }
        }
        ModelTag::Free
    }

    /// Whether the model supports the given usage category.
    pub fn supports(&self, usage: ModelUsage) -> bool {
        self.usage.contains(&usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::ServerContextWindow;

    fn server_model(capabilities: Vec<ModelCapability>) -> ServerModel {
        ServerModel {
            model_ref: "anthropic::unknown::anthropic.claude-3-opus-20240229-v1_0".to_string(),
            display_name: "Opus".to_string(),
            model_name: "anthropic.claude-3-opus-20240229-v1_0".to_string(),
            capabilities,
            category: ModelCategory::Balanced,
            status: ModelStatus::Stable,
            tier: ModelTier::Enterprise,
            context_window: ServerContextWindow {
                max_input_tokens: 9000,
                max_output_tokens: 4000,
            },
        }
    }

    #[test]
    fn test_from_api_fields() {
        let model = Model::from_api(&server_model(vec![ModelCapability::Chat])).unwrap();
        assert_eq!(model.id, "anthropic.claude-3-opus-20240229-v1_0");
        assert_eq!(model.title, "Opus");
        assert_eq!(model.provider, "anthropic");
        assert_eq!(model.context_window.input, 9000);
        assert_eq!(model.context_window.output, 4000);
        assert_eq!(model.tier(), ModelTag::Enterprise);
    }

    #[test]
    fn test_chat_capability_implies_edit_usage() {
        let model = Model::from_api(&server_model(vec![ModelCapability::Chat])).unwrap();
        assert!(model.supports(ModelUsage::Chat));
        assert!(model.supports(ModelUsage::Edit));
        assert!(!model.supports(ModelUsage::Autocomplete));
    }

    #[test]
    fn test_autocomplete_capability() {
        let model = Model::from_api(&server_model(vec![ModelCapability::Autocomplete])).unwrap();
        assert!(!model.supports(ModelUsage::Chat));
        assert!(model.supports(ModelUsage::Autocomplete));
    }

    #[test]
    fn test_from_api_rejects_malformed_ref() {
        let mut server = server_model(vec![ModelCapability::Chat]);
        server.model_ref = "no-namespace".to_string();
        assert!(Model::from_api(&server).is_err());
    }

    #[test]
    fn test_untagged_model_counts_as_free() {
        let model = Model::new("free-model", vec![ModelUsage::Chat]);
        assert_eq!(model.tier(), ModelTag::Free);
    }

    #[test]
    fn test_new_derives_provider_from_id() {
        let model = Model::new("anthropic/claude-3-haiku", vec![ModelUsage::Chat]);
        assert_eq!(model.provider, "anthropic");
        assert_eq!(model.title, "claude-3-haiku");
    }
}
