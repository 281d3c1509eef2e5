//! Built-in model catalog for hosted-service accounts.
//!
//! Used before (or without) a server-sent configuration. The first entry is
//! the default chat model.

use super::model::Model;
use super::types::{ContextWindow, ModelTag, ModelUsage};

/// The static hosted-service catalog.
pub fn default_models() -> Vec<Model> {
    vec![
        Model::new(
            "anthropic/claude-3-5-sonnet-20240620",
            vec![ModelUsage::Chat, ModelUsage::Edit],
        )
        .with_title("Claude 3.5 Sonnet")
        .with_context_window(ContextWindow::extended_chat())
        .with_tags(vec![ModelTag::Free, ModelTag::Balanced]),
        Model::new(
            "anthropic/claude-3-opus-20240229",
            vec![ModelUsage::Chat, ModelUsage::Edit],
        )
        .with_title("Claude 3 Opus")
        .with_tags(vec![ModelTag::Pro, ModelTag::Power]),
        Model::new(
            "anthropic/claude-3-haiku-20240307",
            vec![ModelUsage::Chat, ModelUsage::Edit],
        )
        .with_title("Claude 3 Haiku")
        .with_tags(vec![ModelTag::Free, ModelTag::Speed]),
        Model::new("openai/gpt-4o", vec![ModelUsage::Chat, ModelUsage::Edit])
            .with_title("GPT-4o")
            .with_tags(vec![ModelTag::Pro, ModelTag::Power]),
        Model::new("fireworks/starcoder", vec![ModelUsage::Autocomplete])
            .with_title("StarCoder")
            .with_context_window(ContextWindow {
                input: 2_048,
                output: 256,
                context: None,
            })
            .with_tags(vec![ModelTag::Free, ModelTag::Speed]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_model_is_a_chat_model() {
        let models = default_models();
        assert!(models[0].supports(ModelUsage::Chat));
    }

    #[test]
    fn test_contains_extended_context_model() {
        let models = default_models();
        let sonnet = models
            .iter()
            .find(|m| m.id == "anthropic/claude-3-5-sonnet-20240620")
            .unwrap();
        assert!(sonnet.context_window.context.unwrap().user > 0);
    }

    #[test]
    fn test_contains_autocomplete_model() {
        assert!(default_models()
            .iter()
            .any(|m| m.supports(ModelUsage::Autocomplete)));
    }

    #[test]
    fn test_ids_are_unique() {
        let models = default_models();
        let mut ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), models.len());
    }
}
