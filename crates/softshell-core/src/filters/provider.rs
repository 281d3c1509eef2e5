//! Context-filters provider — policy state, decision cache, refetch scheduler.
//!
//! The provider owns the last fetched policy, a bounded per-repo decision
//! cache, and a cancellable timer that revalidates the policy on an adaptive
//! cadence: hourly after a successful ("durable") fetch, with a growing
//! backoff from a 7-second base after failures and transient ("ephemeral")
//! results.
//!
//! Failure semantics are fail-closed: until a policy has been fetched
//! successfully, every repo name is ignored.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::api::ApiError;
use crate::auth::AuthStatus;
use crate::repo::RepoNameResolver;
use crate::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::policy::{ContextFilters, Policy};

/// Base revalidation interval after a durable result: one hour.
pub const REFETCH_DURABLE_BASE: Duration = Duration::from_secs(60 * 60);
/// Base revalidation interval after an ephemeral result: seven seconds.
pub const REFETCH_EPHEMERAL_BASE: Duration = Duration::from_secs(7);

const EPHEMERAL_BACKOFF: f64 = 1.5;
const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(128).unwrap();
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// How soon a fetch outcome should be revalidated.
///
/// Ephemeral results (network errors, transient server responses) are
/// re-queried soon; durable results are cached for a long interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLifetime {
    Ephemeral,
    Durable,
}

impl ResultLifetime {
    fn base_interval(self) -> Duration {
        match self {
            ResultLifetime::Ephemeral => REFETCH_EPHEMERAL_BASE,
            ResultLifetime::Durable => REFETCH_DURABLE_BASE,
        }
    }

    fn backoff(self) -> f64 {
        match self {
            ResultLifetime::Ephemeral => EPHEMERAL_BACKOFF,
            ResultLifetime::Durable => 1.0,
        }
    }
}

/// A successful policy fetch: the filters plus whether the result is
/// transient (and should be revalidated soon).
#[derive(Debug, Clone)]
pub struct PolicyResponse {
    pub filters: ContextFilters,
    pub transient: bool,
}

/// Collaborator that fetches the context-filter policy from the server.
pub trait PolicyFetcher: Send + Sync {
    fn fetch_policy(&self) -> BoxFuture<'_, Result<PolicyResponse, ApiError>>;
}

/// The outcome of a URI-ignored decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsIgnored {
    /// The URI may be used as context.
    NotIgnored,
    /// The active policy is the exclude-everything sentinel.
    HasIgnoreEverythingFilters,
    /// Not a local file URI; no repository can be resolved for it.
    NonFileUri,
    /// No repository context could be resolved for the URI.
    NoRepoFound,
    /// A resolved repository for the URI is ignored by the policy.
    Repo(String),
}

impl IsIgnored {
    pub fn is_ignored(&self) -> bool {
        !matches!(self, IsIgnored::NotIgnored)
    }
}

impl fmt::Display for IsIgnored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsIgnored::NotIgnored => write!(f, "false"),
            IsIgnored::HasIgnoreEverythingFilters => write!(f, "has-ignore-everything-filters"),
            IsIgnored::NonFileUri => write!(f, "non-file-uri"),
            IsIgnored::NoRepoFound => write!(f, "no-repo-found"),
            IsIgnored::Repo(name) => write!(f, "repo:{name}"),
        }
    }
}

struct ProviderState {
    /// `None` means no policy has been applied yet; decisions fail closed.
    last_response: Option<ContextFilters>,
    policy: Option<Policy>,
    cache: LruCache<String, bool>,
    last_fetch_delay: Duration,
    last_lifetime: Option<ResultLifetime>,
    /// Outcome of the most recently completed fetch, adopted by coalesced
    /// callers.
    last_outcome: Option<ResultLifetime>,
    /// Incremented after every completed fetch.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            last_response: None,
            policy: None,
            cache: LruCache::new(CACHE_CAPACITY),
            last_fetch_delay: Duration::ZERO,
            last_lifetime: None,
            last_outcome: None,
            generation: 0,
            timer: None,
            listener: None,
        }
    }
}

/// The context-filters provider.
///
/// Explicitly constructed and passed to consumers; lifecycle is owned by the
/// application assembly. Construct with [`ContextFiltersProvider::new`], then
/// call [`start`](Self::start) to perform the initial fetch and arm the
/// refetch scheduler.
pub struct ContextFiltersProvider {
    fetcher: Arc<dyn PolicyFetcher>,
    resolver: Arc<dyn RepoNameResolver>,
    state: Mutex<ProviderState>,
    /// Serializes fetches so an in-flight fetch is never raced by a second
    /// one (newest-wins ordering).
    fetch_lock: tokio::sync::Mutex<()>,
    changes: broadcast::Sender<ContextFilters>,
}

impl ContextFiltersProvider {
    pub fn new(
        fetcher: Arc<dyn PolicyFetcher>,
        resolver: Arc<dyn RepoNameResolver>,
    ) -> Arc<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Arc::new(Self {
            fetcher,
            resolver,
            state: Mutex::new(ProviderState::new()),
            fetch_lock: tokio::sync::Mutex::new(()),
            changes,
        })
    }

    /// Fetch the policy once, arm the refetch timer, and listen for auth
    /// changes. An auth change resets all state and refetches immediately.
    pub async fn start(self: &Arc<Self>, mut auth_changes: watch::Receiver<AuthStatus>) {
        let lifetime = self.fetch_context_filters().await;
        self.arm_refetch_timer(lifetime);

        let weak = Arc::downgrade(self);
        let listener = tokio::spawn(async move {
            while auth_changes.changed().await.is_ok() {
                let Some(provider) = weak.upgrade() else { break };
                debug!("auth configuration changed, resetting context filters");
                provider.reset();
                let lifetime = provider.fetch_context_filters().await;
                provider.arm_refetch_timer(lifetime);
            }
        });
        if let Some(old) = self.state().listener.replace(listener) {
            old.abort();
        }
    }

    /// Subscribe to policy changes. Fires with the raw filters whenever the
    /// applied policy differs from the previous one.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ContextFilters> {
        self.changes.subscribe()
    }

    /// Fetch the policy and apply it. Returns the lifetime class governing
    /// when to revalidate.
    ///
    /// At most one fetch is outstanding: a caller arriving while a fetch is
    /// in flight waits for it and adopts its outcome instead of issuing a
    /// second request.
    pub async fn fetch_context_filters(&self) -> ResultLifetime {
        let entered_at = self.state().generation;
        let _guard = self.fetch_lock.lock().await;
        {
            let state = self.state();
            if state.generation != entered_at {
                if let Some(outcome) = state.last_outcome {
                    return outcome;
                }
            }
        }

        let lifetime = match self.fetcher.fetch_policy().await {
            Ok(response) => {
                self.set_context_filters(response.filters);
                if response.transient {
                    ResultLifetime::Ephemeral
                } else {
                    ResultLifetime::Durable
                }
            }
            Err(error) => {
                warn!(%error, "context filter fetch failed, keeping last-known policy");
                ResultLifetime::Ephemeral
            }
        };

        let mut state = self.state();
        state.generation += 1;
        state.last_outcome = Some(lifetime);
        lifetime
    }

    fn set_context_filters(&self, filters: ContextFilters) {
        {
            let mut state = self.state();
            if state.last_response.as_ref() == Some(&filters) {
                return;
            }
            state.cache.clear();
            state.policy = Some(Policy::parse(&filters));
            state.last_response = Some(filters.clone());
            debug!(?filters, "context filters updated");
        }
        let _ = self.changes.send(filters);
    }

    /// Override the policy for testing, going through the same invalidation
    /// path as a real fetch. `None` resets and refetches from the server.
    pub async fn set_testing_filters(self: &Arc<Self>, filters: Option<ContextFilters>) {
        match filters {
            Some(filters) => self.set_context_filters(filters),
            None => {
                self.reset();
                let lifetime = self.fetch_context_filters().await;
                self.arm_refetch_timer(lifetime);
            }
        }
    }

    /// The current refetch delay and lifetime class. Visible for testing.
    pub fn timer_state_for_test(&self) -> (Duration, Option<ResultLifetime>) {
        let state = self.state();
        (state.last_fetch_delay, state.last_lifetime)
    }

    /// Arm the refetch timer according to the lifetime of the result just
    /// obtained. A repeated lifetime class multiplies the delay by the
    /// class's backoff factor (ephemeral growth is capped at the durable
    /// base interval); a changed class resets to the class's base interval.
    pub fn arm_refetch_timer(self: &Arc<Self>, lifetime: ResultLifetime) {
        let delay = {
            let mut state = self.state();
            if state.last_lifetime == Some(lifetime) {
                state.last_fetch_delay = state
                    .last_fetch_delay
                    .mul_f64(lifetime.backoff())
                    .min(REFETCH_DURABLE_BASE);
            } else {
                state.last_fetch_delay = lifetime.base_interval();
                state.last_lifetime = Some(lifetime);
            }
            state.last_fetch_delay
        };

        // The task holds only a weak reference: dropping the provider is
        // never blocked by a pending timer.
        let weak = Arc::downgrade(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(provider) = weak.upgrade() else { return };
            let lifetime = provider.fetch_context_filters().await;
            provider.arm_refetch_timer(lifetime);
        });
        if let Some(old) = self.state().timer.replace(timer) {
            old.abort();
        }
    }

    /// Decide whether a repo name is ignored. Synchronous and cached.
    ///
    /// With no applied policy the decision is "ignored" (fail closed).
    pub fn is_repo_name_ignored(&self, repo_name: &str) -> bool {
        let mut state = self.state();
        if let Some(ignored) = state.cache.get(repo_name).copied() {
            return ignored;
        }
        let ignored = match &state.policy {
            None => true,
            Some(policy) => policy.is_repo_name_ignored(repo_name),
        };
        state.cache.put(repo_name.to_string(), ignored);
        ignored
    }

    /// Decide whether a URI is ignored, resolving its repository name(s)
    /// through the injected resolver. Cancellable via `cancel`.
    pub async fn is_uri_ignored(&self, uri: &Url, cancel: &CancellationToken) -> IsIgnored {
        {
            let state = self.state();
            // Remote http(s) context is filtered server-side; always safe.
            let trusted_scheme = matches!(uri.scheme(), "http" | "https");
            if trusted_scheme || matches!(state.policy, Some(Policy::AllowAll)) {
                return IsIgnored::NotIgnored;
            }
            if matches!(state.policy, Some(Policy::DenyAll)) {
                return IsIgnored::HasIgnoreEverythingFilters;
            }
        }

        if uri.scheme() != "file" {
            debug!(scheme = %uri.scheme(), "cannot resolve a repo for non-file URI");
            return IsIgnored::NonFileUri;
        }

        let repo_names = match self.resolver.resolve_repo_names(uri, cancel).await {
            Ok(names) => names,
            Err(error) => {
                debug!(%error, "repo name resolution failed");
                return IsIgnored::NoRepoFound;
            }
        };
        if cancel.is_cancelled() {
            return IsIgnored::NoRepoFound;
        }

        if repo_names.is_empty() {
            return IsIgnored::NoRepoFound;
        }
        for repo_name in repo_names {
            if self.is_repo_name_ignored(&repo_name) {
                return IsIgnored::Repo(repo_name);
            }
        }
        IsIgnored::NotIgnored
    }

    /// Clear all policy and scheduler state and cancel the pending timer.
    pub fn reset(&self) {
        let mut state = self.state();
        state.last_fetch_delay = Duration::ZERO;
        state.last_lifetime = None;
        state.last_outcome = None;
        state.last_response = None;
        state.policy = None;
        state.cache.clear();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Reset and stop the auth-change listener.
    pub fn dispose(&self) {
        self.reset();
        if let Some(listener) = self.state().listener.take() {
            listener.abort();
        }
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ContextFiltersProvider {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = &state.timer {
            timer.abort();
        }
        if let Some(listener) = &state.listener {
            listener.abort();
        }
    }
}

