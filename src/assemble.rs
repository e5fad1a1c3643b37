//! Streaming document assembly.
//!
//! Assembly fetches the content of every included file with bounded
//! concurrency and emits one deterministic text artifact: a header, the
//! rendered directory structure, then a section per file. Fetches race;
//! results are applied to the tree serially on this task, and the emission
//! order is fixed up front, so the artifact is byte-identical across runs
//! regardless of completion order.
//!
//! Cancellation is all-or-nothing: a run observed as cancelled yields
//! [`AssemblyOutcome::Cancelled`], never a truncated document.

use crate::cancel::CancellationToken;
use crate::loader::ContentLoader;
use crate::tree::{render_tree, FileTree};
use crate::types::{NodeId, NodeKind};
use futures::StreamExt;
use tracing::{debug, info};

const SECTION_RULE: &str = "================================================";

/// Fraction-of-work snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Human-readable status line for UIs and logs.
    pub fn status(&self) -> String {
        format!("Loading file content ({}/{})", self.completed, self.total)
    }
}

#[derive(Debug)]
pub struct AssemblyOutput {
    pub document: String,
    pub tree_view: String,
    pub files_rendered: usize,
}

#[derive(Debug)]
pub enum AssemblyOutcome {
    Complete(AssemblyOutput),
    Cancelled,
}

pub struct StreamingAssembler {
    loader: ContentLoader,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl StreamingAssembler {
    pub fn new(loader: ContentLoader, max_concurrent: usize, cancel: CancellationToken) -> Self {
        Self {
            loader,
            max_concurrent: max_concurrent.max(1),
            cancel,
        }
    }

    /// Included files in emission order: largest token estimate first, path
    /// order as the tie-break.
    fn emission_order(tree: &FileTree) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = tree
            .included_files()
            .into_iter()
            .filter(|&id| tree.node(id).kind == NodeKind::File)
            .collect();
        ids.sort_by(|&a, &b| {
            let (a, b) = (tree.node(a), tree.node(b));
            b.token_count
                .cmp(&a.token_count)
                .then_with(|| a.path.cmp(&b.path))
        });
        ids
    }

    /// Run assembly over the tree, invoking `on_progress` as fetches land.
    pub async fn assemble(
        &self,
        tree: &mut FileTree,
        mut on_progress: impl FnMut(Progress),
    ) -> AssemblyOutcome {
        if self.cancel.is_cancelled() {
            return AssemblyOutcome::Cancelled;
        }

        let order = Self::emission_order(tree);
        // Snapshot of what still needs fetching; nodes that already carry
        // content are never re-fetched.
        let jobs: Vec<(NodeId, String, u64)> = order
            .iter()
            .map(|&id| tree.node(id))
            .filter(|node| node.content.is_none())
            .map(|node| (node.id, node.path.clone(), node.size))
            .collect();
        let total = jobs.len();
        debug!(files = order.len(), to_fetch = total, "assembly started");

        let loader = &self.loader;
        let mut fetches = futures::stream::iter(
            jobs.into_iter()
                .map(|(id, path, size)| async move { (id, loader.fetch_content(&path, size).await) }),
        )
        .buffer_unordered(self.max_concurrent);

        let mut completed = 0usize;
        while let Some((id, text)) = fetches.next().await {
            if self.cancel.is_cancelled() {
                info!(completed, total, "assembly cancelled");
                return AssemblyOutcome::Cancelled;
            }
            // Serial application on this task keeps tree mutation
            // single-threaded while fetches stay in flight.
            ContentLoader::apply_content(tree, id, text);
            completed += 1;
            if completed % 5 == 0 || completed == total {
                on_progress(Progress { completed, total });
            }
        }
        drop(fetches);

        if self.cancel.is_cancelled() {
            return AssemblyOutcome::Cancelled;
        }

        let tree_view = render_tree(tree);
        let document = Self::emit(tree, &order, &tree_view);
        info!(files = order.len(), bytes = document.len(), "assembly complete");
        AssemblyOutcome::Complete(AssemblyOutput {
            document,
            tree_view,
            files_rendered: order.len(),
        })
    }

    fn emit(tree: &FileTree, order: &[NodeId], tree_view: &str) -> String {
        let root = tree.node(tree.root());
        let mut out = String::new();
        out.push_str(&format!("Repository: {}\n", root.name));
        out.push_str(&format!("Files analyzed: {}\n", root.total_file_count));
        out.push_str(&format!("Estimated tokens: {}\n", root.total_token_count));
        out.push_str("\nDirectory structure:\n\n");
        out.push_str(tree_view);
        for &id in order {
            let node = tree.node(id);
            out.push('\n');
            out.push_str(SECTION_RULE);
            out.push('\n');
            out.push_str(&format!("FILE: {}\n", node.path));
            out.push_str(SECTION_RULE);
            out.push('\n');
            out.push_str(node.content.as_deref().unwrap_or(""));
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
