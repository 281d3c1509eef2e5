//! Model catalog and per-site preference management.
//!
//! [`ModelsService`] owns the catalog of available models and resolves which
//! model to use per usage category, honoring account-tier gating and the
//! precedence user-selection → server default → first compatible.

/// Built-in hosted-service catalog.
pub mod dotcom;
/// The internal model representation.
pub mod model;
/// Persisted per-site preferences.
pub mod preferences;
/// Server-sent model configuration wire format.
pub mod server;
/// The models service itself.
pub mod service;
/// Usage categories, tags, and token budgets.
pub mod types;

pub use model::Model;
pub use preferences::{PerSitePreferences, SitePreferences, MODEL_PREFERENCES_KEY};
pub use server::{ServerModel, ServerModelConfiguration};
pub use service::{ModelError, ModelsService};
pub use types::{ContextWindow, ModelTag, ModelUsage};
