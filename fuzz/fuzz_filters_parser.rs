//! Fuzz target for the context-filter policy pipeline.
//!
//! Run with: cargo +nightly fuzz run fuzz_filters_parser
//!
//! Feeds arbitrary bytes through the full wire-to-decision path: JSON
//! deserialization into `ContextFilters`, policy compilation (including
//! hostile regex patterns), and a repo-name decision. None of it may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use softshell_core::filters::{ContextFilters, Policy};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(filters) = serde_json::from_str::<ContextFilters>(s) else {
        return;
    };
    let policy = Policy::parse(&filters);
    let _ = policy.is_repo_name_ignored("github.com/acme/app");
    let _ = policy.is_repo_name_ignored("");
});
