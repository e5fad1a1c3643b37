//! Core types for the repository ingestion engine.

use serde::{Deserialize, Serialize};

/// NodeId: index of a node inside its owning [`FileTree`](crate::tree::FileTree) arena.
///
/// Ids are assigned densely in creation order and never reused within a tree.
/// A NodeId is only meaningful together with the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of a discovered filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
    Submodule,
}

impl NodeKind {
    pub fn is_directory(self) -> bool {
        matches!(self, NodeKind::Directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_directory_kind_is_directory() {
        assert!(NodeKind::Directory.is_directory());
        assert!(!NodeKind::File.is_directory());
        assert!(!NodeKind::Symlink.is_directory());
        assert!(!NodeKind::Submodule.is_directory());
    }
}
