//! Remote-tree construction strategy.
//!
//! Builds a size-only tree from the flat recursive listing the GitHub tree
//! API returns. When that listing fails (branch mismatch, truncation, size
//! limits) the builder falls back to the paginated per-directory contents
//! API, recursed under a hard depth ceiling.

use crate::cancel::CancellationToken;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::filter::PatternMatcher;
use crate::github::{GithubApi, RepoInfo, TreeEntry};
use crate::ingest::{dispose, Disposition, TreeSource};
use crate::loader::estimate_tokens;
use crate::tree::FileTree;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RemoteTreeBuilder {
    api: Arc<dyn GithubApi>,
    url: String,
    branch: Option<String>,
    config: IngestConfig,
    cancel: CancellationToken,
}

impl RemoteTreeBuilder {
    pub fn new(
        api: Arc<dyn GithubApi>,
        url: impl Into<String>,
        branch: Option<String>,
        config: IngestConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            url: url.into(),
            branch,
            config,
            cancel,
        }
    }

    /// Discover and also hand back the resolved repository coordinates,
    /// which the content loader needs later.
    pub async fn discover_with_repo(&self) -> Result<(RepoInfo, FileTree), IngestError> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        let repo = self.api.repository(&self.url).await?;
        let branch = self
            .branch
            .clone()
            .unwrap_or_else(|| repo.default_branch.clone());
        info!(owner = %repo.owner, name = %repo.name, %branch, "resolved repository");

        let entries = match self.api.recursive_tree(&repo, &branch).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "recursive tree listing failed; falling back to directory listing");
                let mut collected = Vec::new();
                self.fallback_listing(&repo, String::new(), 0, &mut collected)
                    .await?;
                collected
            }
        };
        debug!(entries = entries.len(), "tree listing complete");

        let mut matcher = PatternMatcher::new();
        self.seed_ignore_rules(&repo, &entries, &mut matcher).await;

        let tree = self.build_from_entries(&repo, entries, &matcher)?;
        Ok((repo, tree))
    }

    /// Fetch the repository's root ignore file, when the listing shows one,
    /// and seed the local rule set from it. Failure to fetch is not fatal.
    async fn seed_ignore_rules(
        &self,
        repo: &RepoInfo,
        entries: &[TreeEntry],
        matcher: &mut PatternMatcher,
    ) {
        if !entries
            .iter()
            .any(|e| e.path == ".gitignore" && !e.kind.is_directory())
        {
            return;
        }
        match self.api.file_content(repo, ".gitignore").await {
            Ok(payload) => match payload.bytes() {
                Ok(bytes) => matcher.load_rules(&String::from_utf8_lossy(&bytes)),
                Err(e) => warn!(error = %e, "could not decode .gitignore"),
            },
            Err(e) => warn!(error = %e, "could not fetch .gitignore"),
        }
    }

    /// Paginated per-directory fallback, recursed with a depth ceiling.
    fn fallback_listing<'a>(
        &'a self,
        repo: &'a RepoInfo,
        dir_path: String,
        depth: usize,
        out: &'a mut Vec<TreeEntry>,
    ) -> BoxFuture<'a, Result<(), IngestError>> {
        async move {
            if depth > self.config.max_depth {
                warn!(path = %dir_path, depth, "directory listing skipped past depth ceiling");
                return Ok(());
            }
            let mut page = 1u32;
            loop {
                if self.cancel.is_cancelled() {
                    return Err(IngestError::Cancelled);
                }
                let listing = self.api.directory_listing(repo, &dir_path, page).await?;
                if listing.is_empty() {
                    return Ok(());
                }
                for item in listing {
                    let is_directory = item.kind.is_directory();
                    out.push(TreeEntry {
                        path: item.path.clone(),
                        kind: item.kind,
                        size: item.size,
                    });
                    if is_directory {
                        // Statically excluded directories are never
                        // materialized; skipping the recursion also spares
                        // the API calls.
                        if self.config.policy.excludes(&item.name, true) {
                            continue;
                        }
                        self.fallback_listing(repo, item.path, depth + 1, out)
                            .await?;
                    }
                }
                page += 1;
            }
        }
        .boxed()
    }

    /// Assemble the tree from flat listing entries, shallowest first.
    fn build_from_entries(
        &self,
        repo: &RepoInfo,
        mut entries: Vec<TreeEntry>,
        matcher: &PatternMatcher,
    ) -> Result<FileTree, IngestError> {
        entries.sort_by(|a, b| {
            let depth_a = a.path.matches('/').count();
            let depth_b = b.path.matches('/').count();
            depth_a.cmp(&depth_b).then_with(|| a.path.cmp(&b.path))
        });

        let mut tree = FileTree::new(repo.name.clone());
        let mut index: HashMap<String, NodeId> = HashMap::new();
        index.insert(String::new(), tree.root());
        // Paths of statically dropped directories; everything beneath them
        // is dropped without further evaluation.
        let mut dropped: HashSet<String> = HashSet::new();

        for entry in entries {
            if self.cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }
            let (parent_path, name) = split_path(&entry.path);
            let is_directory = entry.kind.is_directory();

            if dropped.contains(parent_path) {
                if is_directory {
                    dropped.insert(entry.path.clone());
                }
                continue;
            }

            match dispose(matcher, &self.config.policy, &entry.path, name, is_directory) {
                Disposition::Static => {
                    if is_directory {
                        dropped.insert(entry.path.clone());
                    }
                }
                disposition => {
                    let Some(parent) = resolve_parent(
                        &mut tree,
                        &mut index,
                        &mut dropped,
                        matcher,
                        &self.config,
                        parent_path,
                    ) else {
                        if is_directory {
                            dropped.insert(entry.path.clone());
                        }
                        continue;
                    };
                    let size = if is_directory { 0 } else { entry.size };
                    let id = tree.push_node(parent, name, entry.kind, size);
                    if disposition == Disposition::IgnoreFile {
                        tree.node_mut(id).is_included = false;
                    }
                    if is_directory {
                        index.insert(entry.path.clone(), id);
                    } else if entry.kind == NodeKind::File {
                        // Symlink and submodule leaves stay weightless so
                        // the header counts match the rendered sections.
                        let tokens = estimate_tokens(size);
                        let node = tree.node_mut(id);
                        node.token_count = tokens;
                        node.total_token_count = tokens;
                        node.total_file_count = 1;
                        tree.add_child(parent, id);
                    }
                }
            }
        }
        info!(
            nodes = tree.len(),
            files = tree.node(tree.root()).total_file_count,
            "remote tree built"
        );
        Ok(tree)
    }
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}

/// Find or create the directory node for `path`, materializing any
/// intermediate directories the listing never named explicitly. Returns
/// None when the path falls under a statically dropped directory.
fn resolve_parent(
    tree: &mut FileTree,
    index: &mut HashMap<String, NodeId>,
    dropped: &mut HashSet<String>,
    matcher: &PatternMatcher,
    config: &IngestConfig,
    path: &str,
) -> Option<NodeId> {
    if let Some(&id) = index.get(path) {
        return Some(id);
    }
    if dropped.contains(path) {
        return None;
    }
    let (parent_path, name) = split_path(path);
    let parent = resolve_parent(tree, index, dropped, matcher, config, parent_path)?;
    match dispose(matcher, &config.policy, path, name, true) {
        Disposition::Static => {
            dropped.insert(path.to_string());
            None
        }
        disposition => {
            let id = tree.push_node(parent, name, NodeKind::Directory, 0);
            if disposition == Disposition::IgnoreFile {
                tree.node_mut(id).is_included = false;
            }
            index.insert(path.to_string(), id);
            Some(id)
        }
    }
}

#[async_trait]
impl TreeSource for RemoteTreeBuilder {
    async fn discover(&self) -> Result<FileTree, IngestError> {
        let (_, tree) = self.discover_with_repo().await?;
        Ok(tree)
    }
}
