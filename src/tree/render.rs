//! Deterministic tree-string view.
//!
//! A pure function of the tree's current inclusion state: no I/O, children
//! sorted by name at every level, `└──` for the last child and `├──` for the
//! rest. Two trees with the same shape and inclusion flags render to
//! byte-identical strings.

use crate::tree::FileTree;
use crate::types::NodeId;

/// Render the included portion of the tree, root line first.
pub fn render_tree(tree: &FileTree) -> String {
    let root = tree.node(tree.root());
    let mut out = String::new();
    out.push_str(&root.name);
    out.push_str("/\n");
    render_children(tree, tree.root(), "", &mut out);
    out
}

fn included_children_sorted(tree: &FileTree, id: NodeId) -> Vec<NodeId> {
    let mut children: Vec<NodeId> = tree
        .node(id)
        .children
        .iter()
        .copied()
        .filter(|&child| tree.node(child).is_included)
        .collect();
    children.sort_by(|&a, &b| tree.node(a).name.cmp(&tree.node(b).name));
    children
}

fn render_children(tree: &FileTree, id: NodeId, prefix: &str, out: &mut String) {
    let children = included_children_sorted(tree, id);
    let last_index = children.len().saturating_sub(1);
    for (index, child) in children.into_iter().enumerate() {
        let node = tree.node(child);
        let connector = if index == last_index {
            "└── "
        } else {
            "├── "
        };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&node.name);
        if node.is_directory() {
            out.push('/');
        }
        out.push('\n');
        if node.is_directory() {
            let child_prefix = if index == last_index {
                format!("{}    ", prefix)
            } else {
                format!("{}│   ", prefix)
            };
            render_children(tree, child, &child_prefix, out);
        }
    }
}
