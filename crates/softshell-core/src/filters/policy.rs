//! Context-filter wire format and compiled policy.
//!
//! [`ContextFilters`] is the JSON payload the server sends. [`Policy`] is the
//! compiled form: the two "everything" sentinels are recognized structurally
//! at parse time and become dedicated variants, so fast-path checks are
//! pattern matches rather than identity comparisons that would not survive a
//! serialization boundary.

use serde::{Deserialize, Serialize};

use super::pattern::CompiledFilter;

/// The wire form of a context-filter policy.
///
/// `None` for a list means the list is absent, which is different from an
/// empty list: an absent include list means "all included", while an empty
/// one would match nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFilters {
    #[serde(default)]
    pub include: Option<Vec<FilterItem>>,
    #[serde(default)]
    pub exclude: Option<Vec<FilterItem>>,
}

/// One include/exclude rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    pub repo_name_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path_patterns: Option<Vec<String>>,
}

impl ContextFilters {
    /// The sentinel payload meaning "every repository may be used".
    pub fn include_everything() -> Self {
        Self {
            include: Some(vec![FilterItem {
                repo_name_pattern: ".*".to_string(),
                file_path_patterns: None,
            }]),
            exclude: None,
        }
    }

    /// The sentinel payload meaning "no repository may be used".
    pub fn exclude_everything() -> Self {
        Self {
            include: None,
            exclude: Some(vec![FilterItem {
                repo_name_pattern: ".*".to_string(),
                file_path_patterns: None,
            }]),
        }
    }
}

/// A compiled policy, ready for repo-name decisions.
#[derive(Debug, Clone)]
pub enum Policy {
    /// Everything allowed (the include-everything sentinel).
    AllowAll,
    /// Everything denied (the exclude-everything sentinel).
    DenyAll,
    /// Rule-based include/exclude evaluation.
    Rules(RuleSet),
}

/// Compiled include/exclude lists. `None` = list absent on the wire.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub include: Option<Vec<CompiledFilter>>,
    pub exclude: Option<Vec<CompiledFilter>>,
}

impl Policy {
    /// Compile a wire payload, canonicalizing the two sentinel shapes.
    pub fn parse(filters: &ContextFilters) -> Self {
        if *filters == ContextFilters::include_everything() {
            return Policy::AllowAll;
        }
        if *filters == ContextFilters::exclude_everything() {
            return Policy::DenyAll;
        }
        Policy::Rules(RuleSet {
            include: filters
                .include
                .as_ref()
                .map(|items| items.iter().map(CompiledFilter::from_item).collect()),
            exclude: filters
                .exclude
                .as_ref()
                .map(|items| items.iter().map(CompiledFilter::from_item).collect()),
        })
    }

    /// Decide whether a repo name is ignored under this policy.
    ///
    /// An include list, when present, admits only names matched by at least
    /// one include pattern. Any exclude match then flips the decision to
    /// ignored: deny overrides allow.
    pub fn is_repo_name_ignored(&self, repo_name: &str) -> bool {
        match self {
            Policy::AllowAll => false,
            Policy::DenyAll => true,
            Policy::Rules(rules) => {
                let mut ignored = false;
                if let Some(include) = &rules.include {
                    ignored = !include.iter().any(|filter| filter.matches_repo(repo_name));
                }
                if let Some(exclude) = &rules.exclude {
                    if exclude.iter().any(|filter| filter.matches_repo(repo_name)) {
                        ignored = true;
                    }
                }
                ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pattern: &str) -> FilterItem {
        FilterItem {
            repo_name_pattern: pattern.to_string(),
            file_path_patterns: None,
        }
    }

    #[test]
    fn test_sentinels_canonicalize_structurally() {
        // A payload built independently but structurally identical to the
        // sentinel collapses to the same variant.
        let payload = ContextFilters {
            include: Some(vec![item(".*")]),
            exclude: None,
        };
        assert!(matches!(Policy::parse(&payload), Policy::AllowAll));

        let payload = ContextFilters {
            include: None,
            exclude: Some(vec![item(".*")]),
        };
        assert!(matches!(Policy::parse(&payload), Policy::DenyAll));
    }

    #[test]
    fn test_sentinel_survives_serialization_round_trip() {
        let json = serde_json::to_string(&ContextFilters::include_everything()).unwrap();
        let decoded: ContextFilters = serde_json::from_str(&json).unwrap();
        assert!(matches!(Policy::parse(&decoded), Policy::AllowAll));
    }

    #[test]
    fn test_near_sentinel_is_rules() {
        let payload = ContextFilters {
            include: Some(vec![item(".*")]),
            exclude: Some(vec![]),
        };
        assert!(matches!(Policy::parse(&payload), Policy::Rules(_)));
    }

    #[test]
    fn test_exclude_only_policy() {
        let policy = Policy::parse(&ContextFilters {
            include: None,
            exclude: Some(vec![item("acme/secret")]),
        });
        assert!(policy.is_repo_name_ignored("github.com/acme/secret"));
        assert!(!policy.is_repo_name_ignored("github.com/acme/public"));
    }

    #[test]
    fn test_include_only_policy() {
        let policy = Policy::parse(&ContextFilters {
            include: Some(vec![item("acme/")]),
            exclude: None,
        });
        assert!(!policy.is_repo_name_ignored("github.com/acme/public"));
        assert!(policy.is_repo_name_ignored("github.com/other/repo"));
    }

    #[test]
    fn test_deny_overrides_allow() {
        let policy = Policy::parse(&ContextFilters {
            include: Some(vec![item("acme/")]),
            exclude: Some(vec![item("acme/secret")]),
        });
        assert!(policy.is_repo_name_ignored("github.com/acme/secret"));
        assert!(!policy.is_repo_name_ignored("github.com/acme/public"));
    }

    #[test]
    fn test_empty_include_list_matches_nothing() {
        let policy = Policy::parse(&ContextFilters {
            include: Some(vec![]),
            exclude: None,
        });
        assert!(policy.is_repo_name_ignored("github.com/acme/anything"));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{"include":null,"exclude":[{"repoNamePattern":"acme/","filePathPatterns":["\\.env$"]}]}"#;
        let filters: ContextFilters = serde_json::from_str(json).unwrap();
        let exclude = filters.exclude.as_ref().unwrap();
        assert_eq!(exclude[0].repo_name_pattern, "acme/");
        assert_eq!(
            exclude[0].file_path_patterns.as_deref(),
            Some(&["\\.env$".to_string()][..])
        );
    }
}
