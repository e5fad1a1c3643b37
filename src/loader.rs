//! Lazy content loading.
//!
//! Content is fetched only when assembly needs it, and exactly once per
//! node. Every failure mode — oversized file, binary payload, broken
//! encoding, unreadable path, API error — degrades into sentinel text on the
//! node; nothing escapes this boundary as an error, so a single bad file can
//! never abort assembly of the rest of the tree.
//!
//! The fetch half ([`ContentLoader::fetch_content`]) never touches the tree,
//! which is what lets the assembler run many fetches in flight and apply the
//! results serially on its own task.

use crate::github::{GithubApi, RepoInfo};
use crate::tree::FileTree;
use crate::types::NodeId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const SENTINEL_TOO_LARGE: &str = "[file too large to include]";
pub const SENTINEL_BINARY: &str = "[binary file not included]";

fn sentinel_unreadable(reason: impl std::fmt::Display) -> String {
    format!("[could not read file: {}]", reason)
}

/// Flat 4-characters-per-token heuristic, used for both size-based and
/// content-based estimates. Good enough for ordering and display; never
/// tokenizer-accurate.
pub fn estimate_tokens(chars: u64) -> u64 {
    chars.div_ceil(4).max(1)
}

/// Printable-byte-ratio heuristic over at most the first 1024 bytes.
pub fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let sample = &bytes[..bytes.len().min(1024)];
    if sample.contains(&0) {
        return true;
    }
    let printable = sample
        .iter()
        .filter(|&&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..0x7f).contains(&b) || b >= 0x80)
        .count();
    (printable as f64) / (sample.len() as f64) < 0.8
}

/// Where file bytes come from.
pub enum ContentSource {
    Remote {
        api: Arc<dyn GithubApi>,
        repo: RepoInfo,
    },
    Local {
        root: PathBuf,
    },
}

pub struct ContentLoader {
    source: ContentSource,
    max_file_size: u64,
}

impl ContentLoader {
    pub fn new(source: ContentSource, max_file_size: u64) -> Self {
        Self {
            source,
            max_file_size,
        }
    }

    /// Fetch the text for a file, applying the size guard and the
    /// binary/decoding checks. Always returns text; failures are sentinels.
    /// Does not touch any tree.
    pub async fn fetch_content(&self, path: &str, size: u64) -> String {
        if size > self.max_file_size {
            debug!(path, size, "skipping oversized file");
            return SENTINEL_TOO_LARGE.to_string();
        }
        match &self.source {
            ContentSource::Remote { api, repo } => self.fetch_remote(api.as_ref(), repo, path).await,
            ContentSource::Local { root } => Self::fetch_local(root, path).await,
        }
    }

    async fn fetch_remote(&self, api: &dyn GithubApi, repo: &RepoInfo, path: &str) -> String {
        let payload = match api.file_content(repo, path).await {
            Ok(payload) => payload,
            Err(e) => return sentinel_unreadable(e),
        };
        let bytes = match payload.bytes() {
            Ok(bytes) => bytes,
            Err(e) => return sentinel_unreadable(e),
        };
        if looks_binary(&bytes) {
            return SENTINEL_BINARY.to_string();
        }
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => SENTINEL_BINARY.to_string(),
        }
    }

    async fn fetch_local(root: &std::path::Path, path: &str) -> String {
        let absolute = root.join(path);
        let bytes = match tokio::fs::read(&absolute).await {
            Ok(bytes) => bytes,
            Err(e) => return sentinel_unreadable(e),
        };
        if looks_binary(&bytes) {
            return SENTINEL_BINARY.to_string();
        }
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => SENTINEL_BINARY.to_string(),
        }
    }

    /// Store fetched text on a node and propagate the revised token estimate
    /// through the ancestor chain. Must run where tree mutation is
    /// serialized (construction, or the assembly driver task).
    pub fn apply_content(tree: &mut FileTree, id: NodeId, text: String) {
        let new_tokens = estimate_tokens(text.len() as u64);
        let old_tokens = tree.node(id).token_count;
        let delta = new_tokens as i64 - old_tokens as i64;
        tree.node_mut(id).content = Some(text);
        tree.add_tokens(id, delta);
    }

    /// One-shot load: fetch and apply. Idempotent — a node that already has
    /// content, or is not a file, is left untouched. Returns whether a fetch
    /// actually happened.
    pub async fn load(&self, tree: &mut FileTree, id: NodeId) -> bool {
        {
            let node = tree.node(id);
            if node.is_directory() || node.content.is_some() {
                return false;
            }
        }
        let (path, size) = {
            let node = tree.node(id);
            (node.path.clone(), node.size)
        };
        let text = self.fetch_content(&path, size).await;
        Self::apply_content(tree, id, text);
        true
    }
}
