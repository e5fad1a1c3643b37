//! Tree nodes and the arena that owns them.
//!
//! The tree is an arena: `FileTree` owns a flat `Vec<Node>` and nodes refer
//! to each other by [`NodeId`] index. The parent link is a plain index, not
//! an owning reference, so dropping the tree releases every node with no
//! cycle to break. Children keep insertion order; display-order sorting
//! happens in the renderer on copies, never in place.

use crate::types::{NodeId, NodeKind};

/// One filesystem entry in the ingested tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Last path component.
    pub name: String,
    /// Slash-separated path relative to the repository root. The root node's
    /// path is the empty string; its children have bare names as paths.
    pub path: String,
    pub kind: NodeKind,
    /// Byte size. 0 for directories, best-effort for files.
    pub size: u64,
    /// Text payload; absent until lazily loaded, never re-fetched once set.
    pub content: Option<String>,
    /// Token estimate for this node's own content. 0 for directories.
    pub token_count: u64,
    /// Token estimate summed over the included subtree rooted here.
    pub total_token_count: u64,
    /// File count over the included subtree rooted here.
    pub total_file_count: u64,
    /// Inclusion toggle; defaults to true.
    pub is_included: bool,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }
}

/// Arena-backed file tree.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl FileTree {
    /// A tree containing only a root directory node with an empty path.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Node {
            id: NodeId(0),
            name: root_name.into(),
            path: String::new(),
            kind: NodeKind::Directory,
            size: 0,
            content: None,
            token_count: 0,
            total_token_count: 0,
            total_file_count: 0,
            is_included: true,
            children: Vec::new(),
            parent: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Create a node under `parent` and return its id. The child's path is
    /// derived from the parent's. Aggregates are *not* touched — callers use
    /// the incremental ops in [`aggregate`](crate::tree::aggregate) or a
    /// full recompute.
    pub fn push_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        size: u64,
    ) -> NodeId {
        let name = name.into();
        let parent_path = &self.node(parent).path;
        let path = if parent_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", parent_path, name)
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            name,
            path,
            kind,
            size,
            content: None,
            token_count: 0,
            total_token_count: 0,
            total_file_count: 0,
            is_included: true,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Linear path lookup. Builders keep their own `path -> NodeId` table;
    /// this exists for callers and tests that hold only the finished tree.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.path == path).map(|n| n.id)
    }

    /// All included non-directory nodes, in arena order.
    pub fn included_files(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !node.is_included {
                continue;
            }
            if node.is_directory() {
                stack.extend(node.children.iter().copied());
            } else {
                out.push(id);
            }
        }
        out.sort();
        out
    }

    /// Ids of every node in the subtree rooted at `id`, including `id`.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.node(current).children.iter().copied());
        }
        out
    }

    /// Every node in post-order: children before their parent, so aggregate
    /// recomputation can run in one forward pass.
    pub(crate) fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().copied());
        }
        order.reverse();
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_empty_path_and_children_bare_names() {
        let mut tree = FileTree::new("repo");
        let src = tree.push_node(tree.root(), "src", NodeKind::Directory, 0);
        let main = tree.push_node(src, "main.rs", NodeKind::File, 100);
        assert_eq!(tree.node(tree.root()).path, "");
        assert_eq!(tree.node(src).path, "src");
        assert_eq!(tree.node(main).path, "src/main.rs");
    }

    #[test]
    fn test_child_path_is_parent_path_plus_name() {
        let mut tree = FileTree::new("repo");
        let a = tree.push_node(tree.root(), "a", NodeKind::Directory, 0);
        let b = tree.push_node(a, "b", NodeKind::Directory, 0);
        let c = tree.push_node(b, "c.txt", NodeKind::File, 1);
        let child = tree.node(c);
        let parent = tree.node(b);
        assert_eq!(child.path, format!("{}/{}", parent.path, child.name));
    }

    #[test]
    fn test_find_by_path() {
        let mut tree = FileTree::new("repo");
        let src = tree.push_node(tree.root(), "src", NodeKind::Directory, 0);
        let id = tree.push_node(src, "lib.rs", NodeKind::File, 10);
        assert_eq!(tree.find("src/lib.rs"), Some(id));
        assert_eq!(tree.find("src"), Some(src));
        assert_eq!(tree.find("missing"), None);
    }

    #[test]
    fn test_post_order_puts_children_before_parents() {
        let mut tree = FileTree::new("repo");
        let src = tree.push_node(tree.root(), "src", NodeKind::Directory, 0);
        let file = tree.push_node(src, "a.rs", NodeKind::File, 4);
        let order = tree.post_order();
        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(file) < pos(src));
        assert!(pos(src) < pos(tree.root()));
        assert_eq!(order.len(), tree.len());
    }

    #[test]
    fn test_included_files_skips_excluded_subtrees() {
        let mut tree = FileTree::new("repo");
        let src = tree.push_node(tree.root(), "src", NodeKind::Directory, 0);
        let kept = tree.push_node(src, "a.rs", NodeKind::File, 4);
        let hidden_dir = tree.push_node(tree.root(), "gen", NodeKind::Directory, 0);
        tree.push_node(hidden_dir, "big.rs", NodeKind::File, 4);
        tree.node_mut(hidden_dir).is_included = false;
        assert_eq!(tree.included_files(), vec![kept]);
    }
}
