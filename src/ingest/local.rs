//! Local-directory construction strategy.
//!
//! Recursive walk over a directory on disk. Symlinks are followed for
//! classification only; a visited set of canonical directory paths stops
//! symlink cycles, and a depth ceiling stops runaway nesting. Unreadable
//! subdirectories are logged and skipped; only an unreadable root is fatal.

use crate::cancel::CancellationToken;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::filter::PatternMatcher;
use crate::ingest::{dispose, Disposition, TreeSource};
use crate::loader::estimate_tokens;
use crate::tree::FileTree;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const YIELD_EVERY: usize = 64;

pub struct LocalTreeBuilder {
    root: PathBuf,
    config: IngestConfig,
    cancel: CancellationToken,
}

struct Walk<'a> {
    builder: &'a LocalTreeBuilder,
    matcher: PatternMatcher,
    /// Canonical paths of directories currently on the walk stack.
    visiting: HashSet<PathBuf>,
    entries_seen: usize,
}

impl LocalTreeBuilder {
    pub fn new(root: impl Into<PathBuf>, config: IngestConfig, cancel: CancellationToken) -> Self {
        Self {
            root: root.into(),
            config,
            cancel,
        }
    }

    pub async fn build(&self) -> Result<FileTree, IngestError> {
        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string());
        let mut tree = FileTree::new(root_name);

        let mut matcher = PatternMatcher::new();
        match std::fs::read_to_string(self.root.join(".gitignore")) {
            Ok(text) => {
                matcher.load_rules(&text);
                debug!(rules = matcher.local_rule_count(), "loaded .gitignore");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "could not read .gitignore"),
        }

        let mut walk = Walk {
            builder: self,
            matcher,
            visiting: HashSet::new(),
            entries_seen: 0,
        };
        if let Ok(canonical) = dunce::canonicalize(&self.root) {
            walk.visiting.insert(canonical);
        }
        let root_id = tree.root();
        walk.walk_directory(&mut tree, root_id, self.root.clone(), 0)
            .await?;

        if self.cancel.is_cancelled() {
            info!("local walk cancelled; returning partial tree");
        } else {
            info!(
                nodes = tree.len(),
                files = tree.node(tree.root()).total_file_count,
                "local tree built"
            );
        }
        Ok(tree)
    }
}

impl Walk<'_> {
    /// Walk one directory's entries into the tree. Returns Ok on cancel with
    /// whatever was built so far; only a failure to read the walk root is an
    /// error.
    fn walk_directory<'a>(
        &'a mut self,
        tree: &'a mut FileTree,
        parent: NodeId,
        dir: PathBuf,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), IngestError>> {
        async move {
            if depth > self.builder.config.max_depth {
                warn!(path = %dir.display(), depth, "skipping directory past depth ceiling");
                return Ok(());
            }
            let mut entries = match read_sorted(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    if depth == 0 {
                        return Err(IngestError::Io {
                            path: dir,
                            source: e,
                        });
                    }
                    warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
                    return Ok(());
                }
            };

            for (name, path) in entries.drain(..) {
                if self.builder.cancel.is_cancelled() {
                    return Ok(());
                }
                self.entries_seen += 1;
                if self.entries_seen % YIELD_EVERY == 0 {
                    tokio::task::yield_now().await;
                }

                let Some((kind, size)) = classify(&path) else {
                    continue;
                };
                let is_directory = kind.is_directory();
                let rel_path = relative_path(tree, parent, &name);

                match dispose(
                    &self.matcher,
                    &self.builder.config.policy,
                    &rel_path,
                    &name,
                    is_directory,
                ) {
                    Disposition::Static => continue,
                    disposition => {
                        let id = tree.push_node(parent, name, kind, size);
                        if disposition == Disposition::IgnoreFile {
                            tree.node_mut(id).is_included = false;
                        }
                        if is_directory {
                            if let Some(canonical) = self.enter(&path) {
                                self.walk_directory(tree, id, path, depth + 1).await?;
                                self.visiting.remove(&canonical);
                            }
                        } else if kind == NodeKind::File {
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
            Ok(())
        }
        .boxed()
    }

    /// Mark a directory as being walked; None means it is already on the
    /// stack (a symlink cycle) and must not be descended into.
    fn enter(&mut self, path: &Path) -> Option<PathBuf> {
        let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.visiting.insert(canonical.clone()) {
            Some(canonical)
        } else {
            warn!(path = %path.display(), "symlink cycle detected; not descending");
            None
        }
    }
}

async fn read_sorted(dir: &Path) -> Result<Vec<(String, PathBuf)>, std::io::Error> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Classify an entry without assuming anything about symlinks: a symlink to
/// a directory walks like a directory (the cycle guard catches loops), a
/// dangling symlink is recorded as a symlink node, and anything unreadable
/// is skipped.
fn classify(path: &Path) -> Option<(NodeKind, u64)> {
    let symlink_meta = std::fs::symlink_metadata(path).ok()?;
    if symlink_meta.file_type().is_symlink() {
        return match std::fs::metadata(path) {
            Ok(target) if target.is_dir() => Some((NodeKind::Directory, 0)),
            Ok(target) => Some((NodeKind::File, target.len())),
            Err(_) => Some((NodeKind::Symlink, 0)),
        };
    }
    if symlink_meta.is_dir() {
        Some((NodeKind::Directory, 0))
    } else {
        Some((NodeKind::File, symlink_meta.len()))
    }
}

fn relative_path(tree: &FileTree, parent: NodeId, name: &str) -> String {
    let parent_path = &tree.node(parent).path;
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_path, name)
    }
}

#[async_trait]
impl TreeSource for LocalTreeBuilder {
    async fn discover(&self) -> Result<FileTree, IngestError> {
        self.build().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(root: &Path) -> LocalTreeBuilder {
        LocalTreeBuilder::new(root, IngestConfig::default(), CancellationToken::new())
    }

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_walk_applies_static_policy_and_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/a.py", &[b'x'; 10]);
        write(root, "src/b.py", &[b'x'; 4000]);
        write(root, ".git/config", b"[core]");
        write(root, "node_modules/x.js", b"module.exports = 1;");

        let tree = builder(root).build().await.unwrap();
        assert!(tree.find(".git").is_none());
        assert!(tree.find("node_modules").is_none());
        assert!(tree.find("src/a.py").is_some());

        let root_node = tree.node(tree.root());
        assert_eq!(root_node.total_file_count, 2);
        assert_eq!(root_node.total_token_count, 3 + 1000);
    }

    #[tokio::test]
    async fn test_gitignore_excludes_but_materializes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", b"*.log\n");
        write(root, "build.log", b"noise noise noise");
        write(root, "main.rs", b"fn main() {}");

        let tree = builder(root).build().await.unwrap();
        let log = tree.find("build.log").expect("ignored file still present");
        assert!(!tree.node(log).is_included);
        // .gitignore itself plus main.rs.
        assert_eq!(tree.node(tree.root()).total_file_count, 2);
    }

    #[tokio::test]
    async fn test_unreadable_root_is_fatal() {
        let err = builder(Path::new("/nonexistent/repogest-test"))
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[tokio::test]
    async fn test_cancel_yields_partial_tree_without_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"a");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let builder = LocalTreeBuilder::new(dir.path(), IngestConfig::default(), cancel);
        let tree = builder.build().await.unwrap();
        assert!(tree.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sub/file.txt", b"content here");
        std::os::unix::fs::symlink(root, root.join("sub/loop")).unwrap();

        let tree = builder(root).build().await.unwrap();
        assert!(tree.find("sub/file.txt").is_some());
        // The loop symlink resolves to the root, which is already on the
        // walk stack, so it is never descended into.
        assert!(tree.find("sub/loop/sub").is_none());
        assert_eq!(tree.node(tree.root()).total_file_count, 1);
    }

    #[tokio::test]
    async fn test_depth_ceiling_prunes_deep_nesting() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a/b/c/deep.txt", b"deep");
        let mut config = IngestConfig::default();
        config.max_depth = 2;
        let builder = LocalTreeBuilder::new(root, config, CancellationToken::new());
        let tree = builder.build().await.unwrap();
        assert!(tree.find("a/b").is_some());
        assert!(tree.find("a/b/c/deep.txt").is_none());
    }
}
