//! Cancellation token
//!
//! External cancellation signal observed by the turn loop at chunk
//! boundaries. Cloneable so a signal handler and the engine can share
//! one flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Clear the flag for the next send
    pub fn reset(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }
}
