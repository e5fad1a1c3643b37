//! GitHub REST client.
//!
//! Thin `reqwest` implementation of [`GithubApi`]. Every request carries a
//! timeout and the standard API headers; an optional bearer token raises the
//! rate limit. The most recent `x-ratelimit-*` headers are kept as a
//! snapshot behind a lock for side-channel reporting.

use crate::error::IngestError;
use crate::github::{
    DirectoryEntry, FileContent, GithubApi, RateLimitStatus, RepoInfo, TreeEntry,
};
use crate::types::NodeKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("repogest/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    token: Option<String>,
    rate_limit: RwLock<Option<RateLimitStatus>>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    default_branch: String,
    owner: OwnerResponse,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItemResponse>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItemResponse {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryItemResponse {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

/// Extract `owner/repo` from the supported URL shapes:
/// `https://github.com/owner/repo`, with or without `.git` or a trailing
/// sub-path, plus the bare `owner/repo` shorthand.
pub(crate) fn parse_repo_url(url: &str) -> Result<(String, String), IngestError> {
    let trimmed = url.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .or_else(|| trimmed.strip_prefix("github.com/"))
        .unwrap_or(trimmed);
    let mut segments = rest.split('/');
    let owner = segments.next().unwrap_or_default();
    let name = segments
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git");
    if owner.is_empty() || name.is_empty() || owner.contains(':') {
        return Err(IngestError::InvalidUrl(url.to_string()));
    }
    Ok((owner.to_string(), name.to_string()))
}

fn entry_kind(raw: &str) -> NodeKind {
    match raw {
        "tree" | "dir" => NodeKind::Directory,
        "commit" | "submodule" => NodeKind::Submodule,
        "symlink" => NodeKind::Symlink,
        _ => NodeKind::File,
    }
}

/// Error bodies are JSON with a `message` field; fall back to the raw body
/// when they are not.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn rate_limit_from_headers(headers: &reqwest::header::HeaderMap) -> Option<RateLimitStatus> {
    let parse = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    };
    Some(RateLimitStatus {
        limit: parse("x-ratelimit-limit")?,
        remaining: parse("x-ratelimit-remaining")?,
        reset_epoch: parse("x-ratelimit-reset")?,
    })
}

impl GithubClient {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            token,
            rate_limit: RwLock::new(None),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, IngestError> {
        let url = format!("{}{}", API_ROOT, path);
        debug!(%url, "GitHub API request");
        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if let Some(snapshot) = rate_limit_from_headers(response.headers()) {
            if snapshot.remaining == 0 {
                warn!(reset_epoch = snapshot.reset_epoch, "GitHub rate limit exhausted");
            }
            *self.rate_limit.write() = Some(snapshot);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(IngestError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        let parsed = response.json::<T>().await?;
        Ok(parsed)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn repository(&self, url: &str) -> Result<RepoInfo, IngestError> {
        let (owner, name) = parse_repo_url(url)?;
        let repo: RepoResponse = self
            .get_json(&format!("/repos/{}/{}", owner, name))
            .await?;
        Ok(RepoInfo {
            owner: repo.owner.login,
            name: repo.name,
            default_branch: repo.default_branch,
        })
    }

    async fn recursive_tree(
        &self,
        repo: &RepoInfo,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, IngestError> {
        let listing: TreeResponse = self
            .get_json(&format!(
                "/repos/{}/{}/git/trees/{}?recursive=1",
                repo.owner, repo.name, branch
            ))
            .await?;
        if listing.truncated {
            // An incomplete listing would silently drop files; callers fall
            // back to the paginated contents API instead.
            return Err(IngestError::Api {
                status: 200,
                message: "recursive tree listing truncated".to_string(),
            });
        }
        Ok(listing
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                kind: entry_kind(&item.kind),
                path: item.path,
                size: item.size,
            })
            .collect())
    }

    async fn file_content(
        &self,
        repo: &RepoInfo,
        path: &str,
    ) -> Result<FileContent, IngestError> {
        let payload: ContentResponse = self
            .get_json(&format!(
                "/repos/{}/{}/contents/{}",
                repo.owner, repo.name, path
            ))
            .await?;
        let content = payload.content.ok_or_else(|| {
            IngestError::Decode(format!("contents API returned no content for {}", path))
        })?;
        Ok(FileContent {
            content,
            encoding: payload.encoding.unwrap_or_else(|| "none".to_string()),
        })
    }

    async fn directory_listing(
        &self,
        repo: &RepoInfo,
        path: &str,
        page: u32,
    ) -> Result<Vec<DirectoryEntry>, IngestError> {
        let listing: Vec<DirectoryItemResponse> = self
            .get_json(&format!(
                "/repos/{}/{}/contents/{}?page={}&per_page=100",
                repo.owner, repo.name, path, page
            ))
            .await?;
        Ok(listing
            .into_iter()
            .map(|item| DirectoryEntry {
                kind: entry_kind(&item.kind),
                name: item.name,
                path: item.path,
                size: item.size,
            })
            .collect())
    }

    fn rate_limit(&self) -> Option<RateLimitStatus> {
        *self.rate_limit.read()
    }
}
