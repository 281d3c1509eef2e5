//! Repo-name pattern matching.
//!
//! Patterns are regular expressions matched with substring-find semantics:
//! a pattern matches if it is found anywhere in the repo name, not only as a
//! full match. `acme/` therefore matches `github.com/acme/anything`. The
//! `regex` crate's `is_match` already searches unanchored, which is exactly
//! the behavior the server-side filter evaluation uses.

use regex::Regex;
use tracing::warn;

use super::policy::FilterItem;

/// Pattern compilation error.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid repo-name pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled repo-name (or file-path) pattern.
///
/// A pattern that fails to compile degrades to match-nothing rather than
/// poisoning the whole policy: a bad remote pattern in an include list admits
/// nothing (fail closed), in an exclude list it excludes nothing.
#[derive(Debug, Clone)]
pub struct RepoPattern {
    raw: String,
    regex: Option<Regex>,
}

impl RepoPattern {
    /// Compile a pattern, degrading to match-nothing on an invalid regex.
    pub fn compile(raw: &str) -> Self {
        match Regex::new(raw) {
            Ok(regex) => Self {
                raw: raw.to_string(),
                regex: Some(regex),
            },
            Err(error) => {
                warn!(pattern = %raw, %error, "invalid filter pattern, treating as match-nothing");
                Self {
                    raw: raw.to_string(),
                    regex: None,
                }
            }
        }
    }

    /// Compile a pattern, failing on an invalid regex.
    pub fn try_compile(raw: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(raw).map_err(|source| PatternError::Invalid {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Self {
            raw: raw.to_string(),
            regex: Some(regex),
        })
    }

    /// Whether the pattern is found anywhere in `name`.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(name))
    }

    /// The original pattern source.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// A compiled filter item: one repo-name pattern plus optional file-path
/// patterns.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub repo_name_pattern: RepoPattern,
    pub file_path_patterns: Option<Vec<RepoPattern>>,
}

impl CompiledFilter {
    /// Compile a wire filter item.
    pub fn from_item(item: &FilterItem) -> Self {
        Self {
            repo_name_pattern: RepoPattern::compile(&item.repo_name_pattern),
            file_path_patterns: item.file_path_patterns.as_ref().map(|patterns| {
                patterns
                    .iter()
                    .map(|pattern| RepoPattern::compile(pattern))
                    .collect()
            }),
        }
    }

    /// Whether the repo-name pattern matches the given repo name.
    pub fn matches_repo(&self, repo_name: &str) -> bool {
        self.repo_name_pattern.is_match(repo_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_find_semantics() {
        let pattern = RepoPattern::compile("acme/secret");
        assert!(pattern.is_match("github.com/acme/secret"));
        assert!(pattern.is_match("github.com/acme/secret-sauce"));
        assert!(!pattern.is_match("github.com/acme/public"));
    }

    #[test]
    fn test_anchors_still_respected() {
        let pattern = RepoPattern::compile("^github\\.com/acme/infra$");
        assert!(pattern.is_match("github.com/acme/infra"));
        assert!(!pattern.is_match("github.com/acme/infra-tools"));
    }

    #[test]
    fn test_invalid_pattern_matches_nothing() {
        let pattern = RepoPattern::compile("[unclosed");
        assert!(!pattern.is_match("github.com/acme/anything"));
        assert_eq!(pattern.raw(), "[unclosed");
    }

    #[test]
    fn test_try_compile_reports_error() {
        let err = RepoPattern::try_compile("(?P<broken").unwrap_err();
        assert!(err.to_string().contains("(?P<broken"));
    }

    #[test]
    fn test_compiled_filter_with_file_paths() {
        let item = FilterItem {
            repo_name_pattern: "acme/".to_string(),
            file_path_patterns: Some(vec!["\\.env$".to_string()]),
        };
        let filter = CompiledFilter::from_item(&item);
        assert!(filter.matches_repo("github.com/acme/app"));
        let paths = filter.file_path_patterns.as_ref().unwrap();
        assert!(paths[0].is_match("config/.env"));
        assert!(!paths[0].is_match(".env.example"));
    }
}
