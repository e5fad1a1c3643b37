//! Hierarchical file/directory model with inclusion-aware aggregates.

pub mod aggregate;
pub mod node;
pub mod render;

pub use node::{FileTree, Node};
pub use render::render_tree;
