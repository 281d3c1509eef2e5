//! HTTP client for the assistant server.
//!
//! Three operations: fetch the context-filter policy (GraphQL), fetch the
//! server's model configuration (REST), and resolve a clone URL to the
//! server's repository name (GraphQL, enterprise repo-name resolution).

use reqwest::Client;
use serde::Deserialize;
use softshell_config::AccessToken;
use std::time::Duration;
use tracing::debug;

use crate::filters::{ContextFilters, PolicyFetcher, PolicyResponse};
use crate::models::ServerModelConfiguration;
use crate::BoxFuture;

const CONTEXT_FILTERS_QUERY: &str = "\
query ContextFilters {
    site {
        contextFilters {
            include { repoNamePattern filePathPatterns }
            exclude { repoNamePattern filePathPatterns }
        }
    }
}";

const REPOSITORY_NAME_QUERY: &str = "\
query RepositoryName($cloneURL: String!) {
    repository(cloneURL: $cloneURL) {
        name
    }
}";

/// Errors from server API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed (check access token)")]
    Auth,

    #[error("server error: {status} — {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response parse error: {0}")]
    Parse(String),
}

/// Client for the assistant server API.
pub struct ApiClient {
    client: Client,
    endpoint: String,
    token: Option<AccessToken>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>, token: Option<AccessToken>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            token,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn graphql(&self, query: &str, variables: serde_json::Value) -> Result<String, ApiError> {
        let mut request = self
            .client
            .post(self.url("/.api/graphql"))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(ApiError::Auth);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Fetch the context-filter policy.
    ///
    /// A server without filter support yields include-everything (durable);
    /// a GraphQL-level error yields exclude-everything marked transient so
    /// the caller revalidates soon.
    pub async fn fetch_context_filters(&self) -> Result<PolicyResponse, ApiError> {
        let body = self
            .graphql(CONTEXT_FILTERS_QUERY, serde_json::json!({}))
            .await?;
        parse_context_filters_body(&body)
    }

    /// Fetch the server's model configuration.
    pub async fn fetch_server_models(&self) -> Result<ServerModelConfiguration, ApiError> {
        let mut request = self
            .client
            .get(self.url("/.api/modelconfig/supported-models.json"))
            .timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(ApiError::Auth);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<ServerModelConfiguration>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Resolve a clone URL to the server's name for that repository.
    pub async fn resolve_repo_name(&self, clone_url: &str) -> Result<Option<String>, ApiError> {
        let body = self
            .graphql(
                REPOSITORY_NAME_QUERY,
                serde_json::json!({ "cloneURL": clone_url }),
            )
            .await?;
        parse_repo_name_body(&body)
    }
}

impl PolicyFetcher for ApiClient {
    fn fetch_policy(&self) -> BoxFuture<'_, Result<PolicyResponse, ApiError>> {
        Box::pin(self.fetch_context_filters())
    }
}

fn parse_context_filters_body(body: &str) -> Result<PolicyResponse, ApiError> {
    let response: GraphQlResponse<ContextFiltersData> =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;

    if !response.errors.is_empty() {
        debug!(errors = ?response.errors, "context filters query returned errors");
        return Ok(PolicyResponse {
            filters: ContextFilters::exclude_everything(),
            transient: true,
        });
    }
    let filters = response
        .data
        .and_then(|data| data.site)
        .and_then(|site| site.context_filters);
    match filters {
        Some(filters) => Ok(PolicyResponse {
            filters,
            transient: false,
        }),
        // Old servers without filter support: everything is allowed.
        None => Ok(PolicyResponse {
            filters: ContextFilters::include_everything(),
            transient: false,
        }),
    }
}

fn parse_repo_name_body(body: &str) -> Result<Option<String>, ApiError> {
    let response: GraphQlResponse<RepositoryData> =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    Ok(response
        .data
        .and_then(|data| data.repository)
        .map(|repository| repository.name))
}

// ── GraphQL wire types (private) ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[allow(dead_code)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContextFiltersData {
    site: Option<ContextFiltersSite>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextFiltersSite {
    context_filters: Option<ContextFilters>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Policy;

    #[test]
    fn test_url_building_strips_trailing_slash() {
        let client = ApiClient::new("https://example.com/", None);
        assert_eq!(client.url("/.api/graphql"), "https://example.com/.api/graphql");
    }

    #[test]
    fn test_parse_filters_payload() {
        let body = r#"{
            "data": { "site": { "contextFilters": {
                "include": [{ "repoNamePattern": "acme/" }],
                "exclude": [{ "repoNamePattern": "acme/secret" }]
            }}}
        }"#;
        let response = parse_context_filters_body(body).unwrap();
        assert!(!response.transient);
        let include = response.filters.include.unwrap();
        assert_eq!(include[0].repo_name_pattern, "acme/");
    }

    #[test]
    fn test_missing_filters_means_include_everything() {
        let body = r#"{ "data": { "site": { "contextFilters": null } } }"#;
        let response = parse_context_filters_body(body).unwrap();
        assert!(!response.transient);
        assert!(matches!(Policy::parse(&response.filters), Policy::AllowAll));
    }

    #[test]
    fn test_graphql_errors_mean_transient_exclude_everything() {
        let body = r#"{ "data": null, "errors": [{ "message": "boom" }] }"#;
        let response = parse_context_filters_body(body).unwrap();
        assert!(response.transient);
        assert!(matches!(Policy::parse(&response.filters), Policy::DenyAll));
    }

    #[test]
    fn test_malformed_body_is_a_parse_error() {
        assert!(matches!(
            parse_context_filters_body("not json"),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_repo_name() {
        let body = r#"{ "data": { "repository": { "name": "acme/app" } } }"#;
        assert_eq!(
            parse_repo_name_body(body).unwrap().as_deref(),
            Some("acme/app")
        );

        let body = r#"{ "data": { "repository": null } }"#;
        assert!(parse_repo_name_body(body).unwrap().is_none());
    }
}
