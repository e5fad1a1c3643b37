//! Error taxonomy for the ingestion pipeline.
//!
//! Only ingestion-level failures (repository metadata or tree listing) abort
//! an operation. Per-directory and per-file failures degrade in place: a
//! directory read error skips that subtree, a content failure becomes
//! sentinel text on the node. Cancellation is a terminal state of its own,
//! distinguishable from both success and failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The given source string could not be parsed as a repository URL.
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    /// The GitHub API answered with a non-success status.
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure talking to the remote API.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response payload could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Local filesystem failure that is fatal for the operation
    /// (e.g. the walk root itself cannot be read).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation was cancelled cooperatively. Not a failure.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration (bad file, bad value).
    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether this error is the cooperative-cancellation terminal state.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_not_conflated_with_failures() {
        assert!(IngestError::Cancelled.is_cancelled());
        assert!(!IngestError::InvalidUrl("x".into()).is_cancelled());
        assert!(!IngestError::Api {
            status: 404,
            message: "missing".into()
        }
        .is_cancelled());
    }

    #[test]
    fn test_api_error_display_carries_status() {
        let err = IngestError::Api {
            status: 403,
            message: "rate limited".into(),
        };
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("rate limited"));
    }
}
