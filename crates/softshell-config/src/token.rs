//! Access-token handling with automatic zeroization.
//!
//! The server access token is the one credential this client holds. It is
//! never written to the config file; the config names an environment variable
//! and the token is read from there at startup.
//!
//! ## Security Properties
//!
//! - The token value is cleared from memory on drop.
//! - The token is redacted in `Debug` output (shown as `[REDACTED]`).
//! - Nothing in this crate logs or displays the token value.

use std::fmt;

use zeroize::Zeroize;

/// A server access token with automatic zeroization.
#[derive(Clone)]
pub struct AccessToken {
    inner: String,
}

impl AccessToken {
    /// Create a token from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Get the token as a string slice.
    ///
    /// Use sparingly — prefer passing the whole [`AccessToken`] around and
    /// exposing only at the request-building site.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Token length (without exposing the value).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("inner", &"[REDACTED]")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
