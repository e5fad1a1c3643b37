//! Cooperative cancellation.
//!
//! Cancellation is checked at well-defined points (before each directory
//! read, before each content fetch, before each output section); no work is
//! forcibly preempted. Tokens are cheap to clone and share across tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Cloning produces a handle to the same flag, so a caller can keep one
/// handle and hand clones to long-running operations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
