//! Shared model vocabulary: usage categories, tags, context windows, and
//! token-budget constants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback chat input budget for unknown models, in tokens.
pub const CHAT_INPUT_TOKEN_BUDGET: u32 = 30_720;
/// Fallback chat output budget for unknown models, in tokens.
pub const CHAT_OUTPUT_TOKEN_BUDGET: u32 = 4_000;
/// Input budget for models with an extended context window.
pub const EXTENDED_CHAT_INPUT_TOKEN_BUDGET: u32 = 45_000;
/// Share of an extended window reserved for user-added context items.
pub const EXTENDED_USER_CONTEXT_TOKEN_BUDGET: u32 = 30_000;

/// A model's consumption mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelUsage {
    Chat,
    Edit,
    Autocomplete,
}

impl fmt::Display for ModelUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUsage::Chat => write!(f, "chat"),
            ModelUsage::Edit => write!(f, "edit"),
            ModelUsage::Autocomplete => write!(f, "autocomplete"),
        }
    }
}

/// Descriptive and gating tags attached to a model.
///
/// The tier tags (`Free`, `Pro`, `Enterprise`) gate availability by account
/// tier; the rest are descriptive (category, rollout status, origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTag {
    // Tier
    Free,
    Pro,
    Enterprise,
    // Category
    Power,
    Balanced,
    Speed,
    // Status
    Experimental,
    Deprecated,
    Waitlist,
    // Origin
    Local,
    Ollama,
}

/// Token budgets for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub input: u32,
    pub output: u32,
    /// Extended-context budgets, present only on models that support a
    /// larger user-supplied context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ExtendedContext>,
}

/// Extended-context budget split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedContext {
    /// Tokens reserved for user-added context items.
    pub user: u32,
}

impl ContextWindow {
    /// The fallback window used for unknown model ids.
    pub fn default_chat() -> Self {
        Self {
            input: CHAT_INPUT_TOKEN_BUDGET,
            output: CHAT_OUTPUT_TOKEN_BUDGET,
            context: None,
        }
    }

    /// An extended window with a user-context reservation.
    pub fn extended_chat() -> Self {
        Self {
            input: EXTENDED_CHAT_INPUT_TOKEN_BUDGET,
            output: CHAT_OUTPUT_TOKEN_BUDGET,
            context: Some(ExtendedContext {
                user: EXTENDED_USER_CONTEXT_TOKEN_BUDGET,
            }),
        }
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::default_chat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_display_matches_wire_names() {
        assert_eq!(ModelUsage::Chat.to_string(), "chat");
        assert_eq!(ModelUsage::Edit.to_string(), "edit");
        assert_eq!(ModelUsage::Autocomplete.to_string(), "autocomplete");
    }

    #[test]
    fn test_default_window_uses_budget_constants() {
        let window = ContextWindow::default_chat();
        assert_eq!(window.input, CHAT_INPUT_TOKEN_BUDGET);
        assert_eq!(window.output, CHAT_OUTPUT_TOKEN_BUDGET);
        assert!(window.context.is_none());
    }

    #[test]
    fn test_extended_window_reserves_user_context() {
        let window = ContextWindow::extended_chat();
        assert!(window.context.unwrap().user > 0);
    }
}
