//! Tree construction from heterogeneous sources.
//!
//! The two construction strategies — a flat remote tree listing and a
//! recursive local walk — implement the same [`TreeSource`] trait, so the
//! remote fallback logic can be tested in isolation from the local walk and
//! callers never branch on the source kind.
//!
//! Both strategies funnel every discovered entry through the same
//! [`Disposition`] decision: entries dropped by the static policy are never
//! materialized at all, while entries excluded only by ignore-file rules
//! become real nodes with `is_included = false` so a user can see and
//! re-include them.

pub mod local;
pub mod remote;

pub use local::LocalTreeBuilder;
pub use remote::RemoteTreeBuilder;

use crate::error::IngestError;
use crate::filter::{ExclusionPolicy, PatternMatcher};
use crate::tree::FileTree;
use async_trait::async_trait;

/// A source that can be discovered into a size-only tree.
#[async_trait]
pub trait TreeSource: Send + Sync {
    async fn discover(&self) -> Result<FileTree, IngestError>;
}

/// How an entry enters (or fails to enter) the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Materialized, included.
    Include,
    /// Dropped by the static default-exclusion policy; never materialized.
    Static,
    /// Materialized with `is_included = false` (ignore-file rules).
    IgnoreFile,
}

pub(crate) fn dispose(
    matcher: &PatternMatcher,
    policy: &ExclusionPolicy,
    path: &str,
    name: &str,
    is_directory: bool,
) -> Disposition {
    if policy.excludes(name, is_directory) {
        return Disposition::Static;
    }
    if matcher.should_ignore(path, is_directory) {
        return Disposition::IgnoreFile;
    }
    Disposition::Include
}
