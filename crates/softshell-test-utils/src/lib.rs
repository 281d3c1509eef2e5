#![deny(unsafe_code)]

//! Shared test utilities for the Softshell workspace.
//!
//! Provides reusable fixtures, config builders, fake collaborators, and
//! tracing helpers so that individual crate tests stay concise and
//! consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! softshell-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fakes;
pub mod tracing_setup;
