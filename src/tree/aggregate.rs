//! Aggregate maintenance for `total_file_count` / `total_token_count`.
//!
//! Two update modes with very different contracts:
//!
//! - **Incremental** ([`FileTree::add_child`], [`FileTree::add_tokens`]):
//!   O(depth) ancestor walks. Valid while the tree is built single-threaded,
//!   or behind the assembly driver's serialized application point.
//! - **Full recompute** ([`FileTree::recalculate_counts`]): O(subtree) from
//!   the root. The only valid path after any inclusion change, because a
//!   toggle anywhere affects ancestor sums all the way up.
//!
//! After [`FileTree::update_inclusion`] a root recompute **must** run before
//! any aggregate is read. [`FileTree::set_inclusion`] bundles the two so the
//! invariant is hard to violate.

use crate::tree::FileTree;
use crate::types::{NodeId, NodeKind};

fn apply_delta(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

impl FileTree {
    /// Fold a freshly attached child's aggregates into its ancestor chain.
    ///
    /// An excluded child contributes nothing. The walk adds the child's
    /// totals to each ancestor and stops *after* the first excluded one:
    /// an excluded directory still aggregates its own included children,
    /// but its weight is invisible above it.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let child_node = self.node(child);
        if !child_node.is_included {
            return;
        }
        let files = child_node.total_file_count;
        let tokens = child_node.total_token_count;
        if files == 0 && tokens == 0 {
            return;
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            let node = self.node_mut(id);
            node.total_file_count += files;
            node.total_token_count += tokens;
            if !node.is_included {
                break;
            }
            cursor = node.parent;
        }
    }

    /// Adjust a node's own token count by `delta` and propagate the change
    /// up the parent chain. Used by the content loader when a size-based
    /// estimate is replaced with a content-based one.
    pub fn add_tokens(&mut self, id: NodeId, delta: i64) {
        if delta == 0 {
            return;
        }
        let node = self.node_mut(id);
        node.token_count = apply_delta(node.token_count, delta);
        if !node.is_directory() {
            node.total_token_count = apply_delta(node.total_token_count, delta);
        }
        if !node.is_included {
            return;
        }
        let mut cursor = node.parent;
        while let Some(ancestor) = cursor {
            let node = self.node_mut(ancestor);
            node.total_token_count = apply_delta(node.total_token_count, delta);
            if !node.is_included {
                break;
            }
            cursor = node.parent;
        }
    }

    /// Depth-first recompute of every aggregate from the leaves up.
    ///
    /// A file node's aggregates are its own counts; symlink and submodule
    /// leaves carry zero file weight, matching construction; a directory
    /// sums only children with `is_included == true`.
    pub fn recalculate_counts(&mut self) {
        for id in self.post_order() {
            let node = self.node(id);
            if !node.is_directory() {
                let tokens = node.token_count;
                let is_file = node.kind == NodeKind::File;
                let node = self.node_mut(id);
                node.total_file_count = u64::from(is_file);
                node.total_token_count = tokens;
                continue;
            }
            let mut files = 0u64;
            let mut tokens = 0u64;
            for &child in &self.node(id).children {
                let child_node = self.node(child);
                if child_node.is_included {
                    files += child_node.total_file_count;
                    tokens += child_node.total_token_count;
                }
            }
            let node = self.node_mut(id);
            node.total_file_count = files;
            node.total_token_count = tokens;
        }
    }

    /// Set `is_included` on a node and, when asked, on every descendant.
    ///
    /// Flags only — the caller must run [`FileTree::recalculate_counts`]
    /// before reading any aggregate. Prefer [`FileTree::set_inclusion`].
    pub fn update_inclusion(&mut self, id: NodeId, included: bool, propagate_to_children: bool) {
        if propagate_to_children {
            for member in self.subtree(id) {
                self.node_mut(member).is_included = included;
            }
        } else {
            self.node_mut(id).is_included = included;
        }
    }

    /// Inclusion toggle plus the mandatory root-level recompute.
    pub fn set_inclusion(&mut self, id: NodeId, included: bool, propagate_to_children: bool) {
        self.update_inclusion(id, included, propagate_to_children);
        self.recalculate_counts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use proptest::prelude::*;

    /// repo/{src/{a.rs,b.rs}, docs/{guide.md}, README.md}
    fn sample_tree() -> (FileTree, Vec<NodeId>) {
        let mut tree = FileTree::new("repo");
        let root = tree.root();
        let src = tree.push_node(root, "src", NodeKind::Directory, 0);
        let a = tree.push_node(src, "a.rs", NodeKind::File, 40);
        let b = tree.push_node(src, "b.rs", NodeKind::File, 80);
        let docs = tree.push_node(root, "docs", NodeKind::Directory, 0);
        let guide = tree.push_node(docs, "guide.md", NodeKind::File, 20);
        let readme = tree.push_node(root, "README.md", NodeKind::File, 12);
        for &(id, tokens) in &[(a, 10u64), (b, 20), (guide, 5), (readme, 3)] {
            tree.node_mut(id).token_count = tokens;
        }
        tree.recalculate_counts();
        let ids = vec![root, src, a, b, docs, guide, readme];
        (tree, ids)
    }

    fn assert_directory_sums_hold(tree: &FileTree) {
        for node in tree.iter() {
            if !node.is_directory() {
                let expected = u64::from(node.kind == NodeKind::File);
                assert_eq!(node.total_file_count, expected, "leaf {}", node.path);
                assert_eq!(node.total_token_count, node.token_count, "leaf {}", node.path);
                continue;
            }
            let mut files = 0;
            let mut tokens = 0;
            for &child in &node.children {
                let child = tree.node(child);
                if child.is_included {
                    files += child.total_file_count;
                    tokens += child.total_token_count;
                }
            }
            assert_eq!(node.total_file_count, files, "dir {}", node.path);
            assert_eq!(node.total_token_count, tokens, "dir {}", node.path);
        }
    }

    #[test]
    fn test_recalculate_establishes_invariants() {
        let (tree, ids) = sample_tree();
        assert_directory_sums_hold(&tree);
        let root = tree.node(ids[0]);
        assert_eq!(root.total_file_count, 4);
        assert_eq!(root.total_token_count, 38);
    }

    #[test]
    fn test_excluding_directory_hides_subtree_weight() {
        let (mut tree, ids) = sample_tree();
        let src = ids[1];
        tree.set_inclusion(src, false, true);
        let root = tree.node(tree.root());
        assert_eq!(root.total_file_count, 2);
        assert_eq!(root.total_token_count, 8);
        // The excluded node keeps its children; nothing was removed.
        assert_eq!(tree.node(src).children.len(), 2);
        assert_directory_sums_hold(&tree);
    }

    #[test]
    fn test_toggle_off_then_on_restores_every_aggregate() {
        let (mut tree, ids) = sample_tree();
        let before: Vec<(u64, u64)> = tree
            .iter()
            .map(|n| (n.total_file_count, n.total_token_count))
            .collect();
        let src = ids[1];
        tree.set_inclusion(src, false, true);
        tree.set_inclusion(src, true, true);
        let after: Vec<(u64, u64)> = tree
            .iter()
            .map(|n| (n.total_file_count, n.total_token_count))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_excluding_single_file_only_drops_that_file() {
        let (mut tree, ids) = sample_tree();
        let b = ids[3];
        tree.set_inclusion(b, false, false);
        let root = tree.node(tree.root());
        assert_eq!(root.total_file_count, 3);
        assert_eq!(root.total_token_count, 18);
        assert_directory_sums_hold(&tree);
    }

    #[test]
    fn test_add_tokens_propagates_delta_to_ancestors() {
        let (mut tree, ids) = sample_tree();
        let a = ids[2];
        tree.add_tokens(a, 90); // content load revised 10 -> 100
        assert_eq!(tree.node(a).token_count, 100);
        assert_eq!(tree.node(a).total_token_count, 100);
        assert_eq!(tree.node(ids[1]).total_token_count, 120);
        assert_eq!(tree.node(tree.root()).total_token_count, 128);
        assert_directory_sums_hold(&tree);
    }

    #[test]
    fn test_add_tokens_negative_delta() {
        let (mut tree, ids) = sample_tree();
        let b = ids[3];
        tree.add_tokens(b, -15); // 20 -> 5
        assert_eq!(tree.node(b).token_count, 5);
        assert_eq!(tree.node(tree.root()).total_token_count, 23);
        assert_directory_sums_hold(&tree);
    }

    #[test]
    fn test_add_tokens_on_excluded_node_leaves_ancestors_alone() {
        let (mut tree, ids) = sample_tree();
        let readme = ids[6];
        tree.set_inclusion(readme, false, false);
        let root_tokens = tree.node(tree.root()).total_token_count;
        tree.add_tokens(readme, 50);
        assert_eq!(tree.node(readme).token_count, 53);
        assert_eq!(tree.node(tree.root()).total_token_count, root_tokens);
    }

    #[test]
    fn test_symlink_leaves_carry_no_file_weight_through_recompute() {
        let (mut tree, ids) = sample_tree();
        let link = tree.push_node(tree.root(), "latest", NodeKind::Symlink, 0);
        tree.recalculate_counts();
        assert_eq!(tree.node(link).total_file_count, 0);
        assert_eq!(tree.node(link).total_token_count, 0);
        assert_eq!(tree.node(tree.root()).total_file_count, 4);

        // A toggle elsewhere must not promote the symlink into a counted
        // file via the recompute.
        let readme = ids[6];
        tree.set_inclusion(readme, false, false);
        tree.set_inclusion(readme, true, false);
        assert_eq!(tree.node(tree.root()).total_file_count, 4);
        assert_directory_sums_hold(&tree);
    }

    #[test]
    fn test_add_child_incremental_matches_full_recompute() {
        let mut tree = FileTree::new("repo");
        let root = tree.root();
        let src = tree.push_node(root, "src", NodeKind::Directory, 0);
        let file = tree.push_node(src, "a.rs", NodeKind::File, 16);
        {
            let node = tree.node_mut(file);
            node.token_count = 4;
            node.total_token_count = 4;
            node.total_file_count = 1;
        }
        tree.add_child(src, file);

        let mut reference = tree.clone();
        reference.recalculate_counts();
        for (incremental, full) in tree.iter().zip(reference.iter()) {
            assert_eq!(incremental.total_file_count, full.total_file_count);
            assert_eq!(incremental.total_token_count, full.total_token_count);
        }
    }

    #[test]
    fn test_add_child_stops_above_excluded_ancestor() {
        let mut tree = FileTree::new("repo");
        let root = tree.root();
        let hidden = tree.push_node(root, "gen", NodeKind::Directory, 0);
        tree.node_mut(hidden).is_included = false;
        let file = tree.push_node(hidden, "g.rs", NodeKind::File, 8);
        {
            let node = tree.node_mut(file);
            node.token_count = 2;
            node.total_token_count = 2;
            node.total_file_count = 1;
        }
        tree.add_child(hidden, file);
        // The excluded directory aggregates its own children...
        assert_eq!(tree.node(hidden).total_file_count, 1);
        // ...but contributes nothing above itself.
        assert_eq!(tree.node(root).total_file_count, 0);
        assert_eq!(tree.node(root).total_token_count, 0);
    }

    proptest! {
        /// Any sequence of inclusion toggles followed by the mandatory
        /// recompute leaves every directory satisfying the sum invariant.
        #[test]
        fn prop_directory_sums_survive_toggle_sequences(
            toggles in proptest::collection::vec((0usize..7, any::<bool>(), any::<bool>()), 0..24)
        ) {
            let (mut tree, ids) = sample_tree();
            for (index, included, propagate) in toggles {
                tree.set_inclusion(ids[index], included, propagate);
            }
            assert_directory_sums_hold(&tree);
        }

        /// Re-including everything restores the pristine aggregates no
        /// matter what happened in between.
        #[test]
        fn prop_full_reinclusion_restores_baseline(
            toggles in proptest::collection::vec((0usize..7, any::<bool>()), 0..16)
        ) {
            let (mut tree, ids) = sample_tree();
            let baseline: Vec<(u64, u64)> = tree
                .iter()
                .map(|n| (n.total_file_count, n.total_token_count))
                .collect();
            for (index, included) in toggles {
                tree.set_inclusion(ids[index], included, true);
            }
            tree.set_inclusion(tree.root(), true, true);
            let restored: Vec<(u64, u64)> = tree
                .iter()
                .map(|n| (n.total_file_count, n.total_token_count))
                .collect();
            prop_assert_eq!(baseline, restored);
        }
    }
}
