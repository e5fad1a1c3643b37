//! Remote source collaborator.
//!
//! The ingestion engine talks to GitHub through the [`GithubApi`] trait so
//! the remote tree builder, the content loader and the assembler can be
//! exercised against mocks. The concrete [`client::GithubClient`] lives
//! behind it. Rate-limit information travels on a side channel
//! ([`GithubApi::rate_limit`]), never inside the content contract.

pub mod client;

pub use client::GithubClient;

use crate::error::IngestError;
use crate::types::NodeKind;
use async_trait::async_trait;
use base64::Engine;

/// Repository coordinates resolved from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

/// One entry of a recursive tree listing: path, classification, size.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
}

/// Raw file payload as the contents API returns it.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: String,
    /// `"base64"` or `"none"`; anything else is treated as plain text.
    pub encoding: String,
}

impl FileContent {
    /// Raw bytes of the payload. The contents API hard-wraps base64 at 60
    /// columns, so whitespace is stripped before decoding.
    pub fn bytes(&self) -> Result<Vec<u8>, IngestError> {
        if self.encoding == "base64" {
            let compact: String = self
                .content
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| IngestError::Decode(format!("base64: {}", e)))
        } else {
            Ok(self.content.clone().into_bytes())
        }
    }
}

/// One entry of a paginated per-directory listing.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
}

/// Rate-limit snapshot surfaced from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp at which the window resets.
    pub reset_epoch: u64,
}

/// Everything the engine needs from the GitHub REST API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Fetch repository metadata (owner, name, default branch) by URL.
    async fn repository(&self, url: &str) -> Result<RepoInfo, IngestError>;

    /// Fetch the flat recursive tree listing for a branch. Fails (rather
    /// than silently truncating) when the listing is incomplete, so callers
    /// can fall back to [`GithubApi::directory_listing`].
    async fn recursive_tree(
        &self,
        repo: &RepoInfo,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, IngestError>;

    /// Fetch one file's raw content by path.
    async fn file_content(&self, repo: &RepoInfo, path: &str)
        -> Result<FileContent, IngestError>;

    /// Paginated per-directory listing, the fallback when the recursive
    /// listing is unavailable. `page` starts at 1; an empty result means the
    /// listing is exhausted.
    async fn directory_listing(
        &self,
        repo: &RepoInfo,
        path: &str,
        page: u32,
    ) -> Result<Vec<DirectoryEntry>, IngestError>;

    /// Most recent rate-limit snapshot, if any response carried one.
    fn rate_limit(&self) -> Option<RateLimitStatus>;
}
