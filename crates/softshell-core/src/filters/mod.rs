//! Context-filter policy engine.
//!
//! A context filter is a remotely configured include/exclude rule set
//! governing which repositories' code may be used as AI context. The policy
//! is fetched from the server, compiled into regex matchers, cached per repo
//! name, and periodically revalidated.
//!
//! Module layout mirrors the dependency order: [`pattern`] is the leaf regex
//! matcher, [`policy`] holds the wire format and the compiled rule set,
//! [`provider`] owns state, caching, and the refetch scheduler.

pub mod pattern;
pub mod policy;
pub mod provider;

pub use pattern::{CompiledFilter, PatternError, RepoPattern};
pub use policy::{ContextFilters, FilterItem, Policy, RuleSet};
pub use provider::{
    ContextFiltersProvider, IsIgnored, PolicyFetcher, PolicyResponse, ResultLifetime,
};
