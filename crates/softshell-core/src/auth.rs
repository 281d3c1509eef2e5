//! Authentication status and account-tier predicates.
//!
//! The engine never performs authentication itself; it consumes an
//! [`AuthStatus`] slice describing the current account and re-reads it when
//! the configuration changes. Tier predicates on this type drive model
//! availability gating and the choice of repo-name resolution strategy.

use serde::{Deserialize, Serialize};
use softshell_config::AppConfig;

/// The authentication-relevant configuration slice.
///
/// `is_dot_com` distinguishes the hosted service from a self-hosted
/// (enterprise) server. `user_can_upgrade` is true for hosted accounts still
/// on the free plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Server endpoint URL this status applies to.
    pub endpoint: String,
    /// Whether the user is signed in.
    pub authenticated: bool,
    /// Whether the endpoint is the hosted service (as opposed to enterprise).
    pub is_dot_com: bool,
    /// Whether the account can still upgrade to a paid plan.
    pub user_can_upgrade: bool,
    /// Username on the server (informational).
    pub username: String,
}

impl AuthStatus {
    /// Derive the auth slice from the application configuration.
    ///
    /// `authenticated` is decided by the caller (typically: an access token
    /// is present in the configured environment variable).
    pub fn from_config(config: &AppConfig, authenticated: bool) -> Self {
        let is_dot_com = config.account.plan != "enterprise";
        Self {
            endpoint: config.connection.endpoint.clone(),
            authenticated,
            is_dot_com,
            user_can_upgrade: is_dot_com && config.account.plan == "free",
            username: config.account.username.clone(),
        }
    }

    /// Enterprise account on a self-hosted server.
    pub fn is_enterprise_user(&self) -> bool {
        !self.is_dot_com
    }

    /// Hosted-service account on a paid plan.
    pub fn is_pro_user(&self) -> bool {
        self.is_dot_com && !self.user_can_upgrade
    }

    /// Hosted-service account on the free plan.
    pub fn is_free_user(&self) -> bool {
        self.is_dot_com && self.user_can_upgrade
    }
}

impl Default for AuthStatus {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            authenticated: false,
            is_dot_com: true,
            user_can_upgrade: false,
            username: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(is_dot_com: bool, user_can_upgrade: bool) -> AuthStatus {
        AuthStatus {
            endpoint: "https://example.com".to_string(),
            authenticated: true,
            is_dot_com,
            user_can_upgrade,
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_enterprise_predicate() {
        assert!(status(false, false).is_enterprise_user());
        assert!(!status(true, false).is_enterprise_user());
    }

    #[test]
    fn test_pro_and_free_are_disjoint() {
        let pro = status(true, false);
        assert!(pro.is_pro_user());
        assert!(!pro.is_free_user());

        let free = status(true, true);
        assert!(free.is_free_user());
        assert!(!free.is_pro_user());
    }

    #[test]
    fn test_from_config_plans() {
        use softshell_test_utils::config::TestConfigBuilder;

        let config = TestConfigBuilder::new().plan("free").build();
        let auth = AuthStatus::from_config(&config, true);
        assert!(auth.is_free_user());

        let config = TestConfigBuilder::new().plan("pro").build();
        let auth = AuthStatus::from_config(&config, true);
        assert!(auth.is_pro_user());

        let config = TestConfigBuilder::new()
            .endpoint("https://softshell.internal")
            .plan("enterprise")
            .username("alice")
            .build();
        let auth = AuthStatus::from_config(&config, true);
        assert!(auth.is_enterprise_user());
        assert_eq!(auth.endpoint, "https://softshell.internal");
        assert_eq!(auth.username, "alice");
    }
}
