//! Repository-name resolution for workspace URIs.
//!
//! To decide whether a file may be used as context, the provider needs the
//! server-side name of the repository containing it. Hosted-service accounts
//! derive the name locally from the git remote URL; enterprise accounts ask
//! the server, whose repository names are admin-configured and need not match
//! the remote host's.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::api::{ApiClient, ApiError};
use crate::BoxFuture;

/// Errors from repo-name resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("resolution cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Collaborator that resolves the repository name(s) for a workspace URI.
///
/// Returns an empty list when no repository context is resolvable.
pub trait RepoNameResolver: Send + Sync {
    fn resolve_repo_names<'a>(
        &'a self,
        uri: &'a Url,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<String>, ResolveError>>;
}

/// Local resolver: converts the git remote URL to a repo name.
///
/// `git@github.com:owner/repo.git` becomes `github.com/owner/repo`.
pub struct GitRemoteResolver;

impl RepoNameResolver for GitRemoteResolver {
    fn resolve_repo_names<'a>(
        &'a self,
        uri: &'a Url,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<String>, ResolveError>> {
        Box::pin(async move {
            match discover_remote_url(uri, cancel).await? {
                Some(remote) => Ok(convert_clone_url_to_repo_name(&remote)
                    .into_iter()
                    .collect()),
                None => Ok(Vec::new()),
            }
        })
    }
}

/// Enterprise resolver: asks the server which repository name corresponds to
/// the discovered remote URL.
pub struct ServerRepoNameResolver {
    client: Arc<ApiClient>,
}

impl ServerRepoNameResolver {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

impl RepoNameResolver for ServerRepoNameResolver {
    fn resolve_repo_names<'a>(
        &'a self,
        uri: &'a Url,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<String>, ResolveError>> {
        Box::pin(async move {
            let Some(remote) = discover_remote_url(uri, cancel).await? else {
                return Ok(Vec::new());
            };
            let name = tokio::select! {
                result = self.client.resolve_repo_name(&remote) => result?,
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            };
            Ok(name.into_iter().collect())
        })
    }
}

/// Walk up from the URI's path to the nearest `.git/config` and read the
/// `origin` remote URL.
async fn discover_remote_url(
    uri: &Url,
    cancel: &CancellationToken,
) -> Result<Option<String>, ResolveError> {
    let Ok(path) = uri.to_file_path() else {
        return Ok(None);
    };
    let Some(config_path) = find_git_config(&path, cancel).await? else {
        return Ok(None);
    };
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }
    let config = tokio::fs::read_to_string(&config_path).await?;
    Ok(parse_origin_url(&config))
}

async fn find_git_config(
    start: &Path,
    cancel: &CancellationToken,
) -> Result<Option<PathBuf>, ResolveError> {
    let mut current = Some(start.to_path_buf());
    while let Some(dir) = current {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let candidate = dir.join(".git").join("config");
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => return Ok(Some(candidate)),
            _ => {}
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    Ok(None)
}

/// Extract `url` from the `[remote "origin"]` section of a git config.
fn parse_origin_url(config: &str) -> Option<String> {
    let mut in_origin = false;
    for line in config.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_origin = line == r#"[remote "origin"]"#;
            continue;
        }
        if in_origin {
            if let Some(value) = line.strip_prefix("url") {
                let value = value.trim_start().strip_prefix('=')?.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Convert a git clone URL to a repo name: `host/owner/repo`.
///
/// Handles scp-like (`git@host:owner/repo.git`), https, and ssh forms; ports
/// and `.git` suffixes are dropped. Unparseable input yields `None`.
pub fn convert_clone_url_to_repo_name(clone_url: &str) -> Option<String> {
    // scp-like syntax has no scheme: user@host:path
    if !clone_url.contains("://") {
        let (_user, rest) = clone_url.split_once('@')?;
        let (host, path) = rest.split_once(':')?;
        return join_repo_name(host, path);
    }

    let url = Url::parse(clone_url).ok()?;
    let host = url.host_str()?;
    join_repo_name(host, url.path())
}

fn join_repo_name(host: &str, path: &str) -> Option<String> {
    let path = path
        .trim_matches('/')
        .trim_end_matches(".git")
        .trim_end_matches('/');
    if host.is_empty() || path.is_empty() {
        debug!(%host, %path, "cannot derive a repo name from clone URL");
        return None;
    }
    Some(format!("{host}/{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_convert_scp_like_url() {
        assert_eq!(
            convert_clone_url_to_repo_name("git@github.com:sourcegraph/cody.git").as_deref(),
            Some("github.com/sourcegraph/cody")
        );
    }

    #[test]
    fn test_convert_https_url() {
        assert_eq!(
            convert_clone_url_to_repo_name("https://github.com/sourcegraph/cody.git").as_deref(),
            Some("github.com/sourcegraph/cody")
        );
        assert_eq!(
            convert_clone_url_to_repo_name("https://gitlab.example.com/group/project").as_deref(),
            Some("gitlab.example.com/group/project")
        );
    }

    #[test]
    fn test_convert_ssh_url_drops_port() {
        assert_eq!(
            convert_clone_url_to_repo_name("ssh://git@example.com:2222/owner/repo.git").as_deref(),
            Some("example.com/owner/repo")
        );
    }

    #[test]
    fn test_convert_rejects_unparseable() {
        assert!(convert_clone_url_to_repo_name("not a url").is_none());
        assert!(convert_clone_url_to_repo_name("https:///no-host").is_none());
    }

    #[test]
    fn test_parse_origin_url() {
        let config = r#"
[core]
    repositoryformatversion = 0
    filemode = true
[remote "origin"]
    url = https://github.com/sourcegraph/cody.git
    fetch = +refs/heads/*:refs/remotes/origin/*
[remote "fork"]
    url = https://github.com/alice/cody.git
"#;
        assert_eq!(
            parse_origin_url(config).as_deref(),
            Some("https://github.com/sourcegraph/cody.git")
        );
    }

    #[test]
    fn test_parse_origin_url_missing_section() {
        assert!(parse_origin_url("[core]\n\tbare = false\n").is_none());
    }

    #[tokio::test]
    async fn test_git_resolver_walks_up_to_repo_root() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        tokio::fs::create_dir_all(repo.join(".git")).await.unwrap();
        tokio::fs::create_dir_all(repo.join("submodule")).await.unwrap();
        tokio::fs::write(
            repo.join(".git/config"),
            "[remote \"origin\"]\n\turl = git@github.com:sourcegraph/cody.git\n",
        )
        .await
        .unwrap();

        let uri = Url::from_file_path(repo.join("submodule/foo.rs")).unwrap();
        let cancel = CancellationToken::new();
        let names = GitRemoteResolver
            .resolve_repo_names(&uri, &cancel)
            .await
            .unwrap();
        assert_eq!(names, vec!["github.com/sourcegraph/cody".to_string()]);
    }

    #[tokio::test]
    async fn test_git_resolver_no_repo() {
        let tmp = TempDir::new().unwrap();
        let uri = Url::from_file_path(tmp.path().join("orphan.rs")).unwrap();
        let cancel = CancellationToken::new();
        let names = GitRemoteResolver
            .resolve_repo_names(&uri, &cancel)
            .await
            .unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_git_resolver_respects_cancellation() {
        let tmp = TempDir::new().unwrap();
        let uri = Url::from_file_path(tmp.path().join("orphan.rs")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = GitRemoteResolver.resolve_repo_names(&uri, &cancel).await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }
}
