#![deny(unsafe_code)]

//! Softshell client engine.
//!
//! Provides the context-filter policy engine and the model catalog that sit
//! between an AI coding assistant's UI and its server. The two central
//! services are [`ContextFiltersProvider`] (which repositories may be used as
//! model context) and [`ModelsService`] (which model answers, per usage
//! category and account tier).

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future — the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits (stable since Rust 1.75) produces opaque return
/// types that are **not** object-safe. Traits consumed via `Box<dyn Trait>` or
/// `&dyn Trait` must return a concrete `Pin<Box<dyn Future>>` instead. This
/// alias keeps those signatures readable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP client for the assistant server (policy, model config, repo lookup).
pub mod api;
/// Authentication status and account-tier predicates.
pub mod auth;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Context-filter policy: pattern matching, policy evaluation, provider.
pub mod filters;
/// Model catalog, per-site preferences, and default-model resolution.
pub mod models;
/// Repository-name resolution for workspace URIs.
pub mod repo;
/// Key-value storage collaborator for persisted preferences.
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::AuthStatus;
pub use filters::{ContextFilters, ContextFiltersProvider, FilterItem, IsIgnored, PolicyFetcher};
pub use models::{Model, ModelUsage, ModelsService};
pub use repo::RepoNameResolver;
pub use storage::KeyValueStorage;
