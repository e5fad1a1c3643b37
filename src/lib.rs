//! repogest: repository ingestion, filtering and aggregation for LLM
//! consumption.
//!
//! The pipeline: a source ([`ingest::TreeSource`]) discovers a size-only
//! [`tree::FileTree`] with static and ignore-file filtering already applied,
//! inclusion toggles and token/file aggregates stay consistent through
//! [`tree::aggregate`], content loads lazily through [`loader::ContentLoader`],
//! and [`assemble::StreamingAssembler`] produces the final deterministic text
//! artifact.

pub mod assemble;
pub mod cancel;
pub mod config;
pub mod error;
pub mod filter;
pub mod github;
pub mod ingest;
pub mod loader;
pub mod logging;
pub mod tree;
pub mod types;

pub use error::IngestError;
