//! The models service: catalog, preferences, and default resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::AuthStatus;
use crate::storage::KeyValueStorage;

use super::model::Model;
use super::preferences::{PerSitePreferences, MODEL_PREFERENCES_KEY};
use super::server::ServerModelConfiguration;
use super::types::{ContextWindow, ModelTag, ModelUsage};

/// Errors from model-selection operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model {id:?} is not compatible with usage type \"{usage}\".")]
    IncompatibleUsage { id: String, usage: ModelUsage },
}

/// Owns the model catalog and per-site preferences.
///
/// Preferences are persisted as one JSON document through the injected
/// key-value storage. In-memory state is always applied first; a persistence
/// failure is logged and does not roll anything back — at worst the written
/// preference does not survive a restart.
pub struct ModelsService {
    storage: Arc<dyn KeyValueStorage>,
    models: Vec<Model>,
    auth_status: Option<AuthStatus>,
    preferences: PerSitePreferences,
}

impl ModelsService {
    /// Create a service, loading persisted preferences from storage.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let preferences = match storage.get(MODEL_PREFERENCES_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(preferences) => preferences,
                Err(error) => {
                    warn!(%error, "corrupt model preferences, starting fresh");
                    PerSitePreferences::new()
                }
            },
            None => PerSitePreferences::new(),
        };
        Self {
            storage,
            models: Vec::new(),
            auth_status: None,
            preferences,
        }
    }

    /// Set the current authentication status. Preferences are keyed by the
    /// status's endpoint.
    pub fn set_auth_status(&mut self, auth_status: AuthStatus) {
        self.auth_status = Some(auth_status);
    }

    /// Replace the known-models catalog wholesale. Selections re-validate
    /// lazily at resolution time.
    pub fn set_models(&mut self, models: Vec<Model>) {
        self.models = models;
    }

    pub fn get_models(&self) -> &[Model] {
        &self.models
    }

    pub fn get_model_by_id(&self, model_id: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.id == model_id)
    }

    /// The model's declared context window, or the fixed fallback budget for
    /// unknown ids. Never fails.
    pub fn get_context_window_by_id(&self, model_id: &str) -> ContextWindow {
        self.get_model_by_id(model_id)
            .map(|model| model.context_window)
            .unwrap_or_else(ContextWindow::default_chat)
    }

    /// Apply a server-sent model configuration.
    ///
    /// Replaces the catalog, adopts the server defaults for every usage
    /// (the server's chat default feeds both chat and edit; its code
    /// completion default feeds autocomplete), drops user selections whose
    /// model was withdrawn, preserves the rest, and persists. Idempotent for
    /// an unchanged configuration.
    pub async fn set_server_sent_models(&mut self, config: &ServerModelConfiguration) {
        let mut models = Vec::with_capacity(config.models.len());
        for server in &config.models {
            match Model::from_api(server) {
                Ok(model) => models.push(model),
                Err(error) => warn!(%error, "skipping server model with malformed ref"),
            }
        }

        let resolve_ref = |model_ref: &str| -> Option<String> {
            config
                .models
                .iter()
                .find(|server| server.model_ref == model_ref)
                .map(|server| server.model_name.clone())
        };
        let chat_default = resolve_ref(&config.default_models.chat);
        let autocomplete_default = resolve_ref(&config.default_models.code_completion);

        self.models = models;
        let known_ids: Vec<String> = self.models.iter().map(|model| model.id.clone()).collect();

        let endpoint = self.endpoint().to_string();
        let site = self.preferences.entry(endpoint).or_default();
        match chat_default {
            Some(id) => {
                site.defaults.set(ModelUsage::Chat, id.clone());
                site.defaults.set(ModelUsage::Edit, id);
            }
            None => {
                site.defaults.remove(ModelUsage::Chat);
                site.defaults.remove(ModelUsage::Edit);
            }
        }
        match autocomplete_default {
            Some(id) => site.defaults.set(ModelUsage::Autocomplete, id),
            None => site.defaults.remove(ModelUsage::Autocomplete),
        }
        site.selected
            .retain_ids(|id| known_ids.iter().any(|known| known == id));

        self.persist().await;
    }

    /// Record the user's selection for a usage category.
    ///
    /// A model id not present in the catalog is a silent no-op; a known
    /// model that does not support the usage is an error.
    pub async fn set_selected_model(
        &mut self,
        usage: ModelUsage,
        model_id: &str,
    ) -> Result<(), ModelError> {
        let Some(model) = self.get_model_by_id(model_id) else {
            debug!(model = %model_id, %usage, "selection of unknown model ignored");
            return Ok(());
        };
        if !model.supports(usage) {
            return Err(ModelError::IncompatibleUsage {
                id: model.id.clone(),
                usage,
            });
        }

        let endpoint = self.endpoint().to_string();
        let site = self.preferences.entry(endpoint).or_default();
        site.selected.set(usage, model_id);
        self.persist().await;
        Ok(())
    }

    /// Whether the current account tier may use the model. Unknown ids are
    /// never available.
    pub fn is_model_available(&self, model_id: &str) -> bool {
        let Some(model) = self.get_model_by_id(model_id) else {
            return false;
        };
        let tier = model.tier();
        match &self.auth_status {
            Some(auth) if auth.is_enterprise_user() => true,
            Some(auth) => match tier {
                ModelTag::Free => true,
                ModelTag::Pro => auth.is_pro_user(),
                _ => false,
            },
            // No auth known: gate as the most restricted tier.
            None => tier == ModelTag::Free,
        }
    }

    /// Resolve the default model for a usage category.
    ///
    /// Precedence: the user's selection, then the server default — each only
    /// if still in the catalog, compatible, and available — then the first
    /// available usage-compatible catalog model.
    pub fn get_default_model(&self, usage: ModelUsage) -> Option<&Model> {
        if let Some(site) = self.preferences.get(self.endpoint()) {
            for preferred in [&site.selected, &site.defaults] {
                if let Some(model) = preferred
                    .get(usage)
                    .and_then(|id| self.get_model_by_id(id))
                {
                    if model.supports(usage) && self.is_model_available(&model.id) {
                        return Some(model);
                    }
                }
            }
        }
        self.models
            .iter()
            .find(|model| model.supports(usage) && self.is_model_available(&model.id))
    }

    pub fn get_default_chat_model(&self) -> Option<&str> {
        self.get_default_model(ModelUsage::Chat)
            .map(|model| model.id.as_str())
    }

    pub fn get_default_edit_model(&self) -> Option<&str> {
        self.get_default_model(ModelUsage::Edit)
            .map(|model| model.id.as_str())
    }

    fn endpoint(&self) -> &str {
        self.auth_status
            .as_ref()
            .map(|auth| auth.endpoint.as_str())
            .unwrap_or("")
    }

    async fn persist(&self) {
        let serialized = match serde_json::to_string(&self.preferences) {
            Ok(serialized) => serialized,
            Err(error) => {
                warn!(%error, "failed to serialize model preferences");
                return;
            }
        };
        if let Err(error) = self.storage.set(MODEL_PREFERENCES_KEY, &serialized).await {
            warn!(%error, "failed to persist model preferences");
        }
    }
}

