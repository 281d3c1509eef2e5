//! Fuzz target for repo-name pattern matching and clone-URL conversion.
//!
//! Run with: cargo +nightly fuzz run fuzz_repo_match
//!
//! Splits the input into a pattern and a repo name; pattern compilation must
//! never panic (invalid regexes degrade to match-nothing), and neither must
//! matching or clone-URL conversion on arbitrary strings.

#![no_main]

use libfuzzer_sys::fuzz_target;
use softshell_core::filters::RepoPattern;
use softshell_core::repo::convert_clone_url_to_repo_name;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use the first byte as the split point between pattern and repo name
    let split = (data[0] as usize % data.len()).max(1);
    let pattern = std::str::from_utf8(&data[1..split]).unwrap_or(".*");
    let name = std::str::from_utf8(&data[split..]).unwrap_or("github.com/acme/app");

    let compiled = RepoPattern::compile(pattern);
    let _ = compiled.is_match(name);

    let _ = convert_clone_url_to_repo_name(name);
});
