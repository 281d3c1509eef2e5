//! Fake collaborators for the core engine.
//!
//! Deterministic in-memory stand-ins for the network and storage
//! collaborators: [`StaticPolicyFetcher`], [`StaticRepoNameResolver`], and
//! [`MemoryStorage`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use softshell_core::api::ApiError;
use softshell_core::filters::{ContextFilters, PolicyFetcher, PolicyResponse};
use softshell_core::repo::{RepoNameResolver, ResolveError};
use softshell_core::storage::{KeyValueStorage, StorageError};
use softshell_core::BoxFuture;

/// A policy fetcher serving a configurable canned response.
///
/// Counts fetches and can be switched between success and failure
/// mid-test; an optional delay simulates a slow network.
pub struct StaticPolicyFetcher {
    response: Mutex<Option<PolicyResponse>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticPolicyFetcher {
    /// Serve the given filters on every fetch.
    pub fn ok(filters: ContextFilters, transient: bool) -> Self {
        Self {
            response: Mutex::new(Some(PolicyResponse { filters, transient })),
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Fail every fetch with a network error.
    pub fn failing() -> Self {
        Self {
            response: Mutex::new(None),
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the canned response.
    pub fn set_response(&self, filters: ContextFilters, transient: bool) {
        *self.response() = Some(PolicyResponse { filters, transient });
    }

    /// Make subsequent fetches fail.
    pub fn set_failing(&self) {
        *self.response() = None;
    }

    /// How many fetches have been answered.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn response(&self) -> MutexGuard<'_, Option<PolicyResponse>> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PolicyFetcher for StaticPolicyFetcher {
    fn fetch_policy(&self) -> BoxFuture<'_, Result<PolicyResponse, ApiError>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.response().clone() {
                Some(response) => Ok(response),
                None => Err(ApiError::Network("connection refused".to_string())),
            }
        })
    }
}

/// A resolver returning a fixed list of repo names for every URI.
pub struct StaticRepoNameResolver {
    names: Vec<String>,
}

impl StaticRepoNameResolver {
    /// Resolve every URI to no repository.
    pub fn empty() -> Self {
        Self { names: Vec::new() }
    }

    /// Resolve every URI to the given names.
    pub fn with_names(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl RepoNameResolver for StaticRepoNameResolver {
    fn resolve_repo_names<'a>(
        &'a self,
        _uri: &'a Url,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<String>, ResolveError>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            Ok(self.names.clone())
        })
    }
}

/// In-memory key-value storage.
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.data().get(key).cloned()
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.data().insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.data().remove(key);
            Ok(())
        })
    }
}
