//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use softshell_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .endpoint("https://softshell.internal")
///     .plan("enterprise")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.config.connection.endpoint = endpoint.to_string();
        self
    }

    pub fn token_env(mut self, token_env: &str) -> Self {
        self.config.connection.token_env = token_env.to_string();
        self
    }

    pub fn plan(mut self, plan: &str) -> Self {
        self.config.account.plan = plan.to_string();
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.config.account.username = username.to_string();
        self
    }

    pub fn preferences_path(mut self, path: &str) -> Self {
        self.config.storage.preferences_path = path.to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
