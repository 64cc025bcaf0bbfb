//! Cooperative cancellation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How often [`CancellationToken::cancelled`] checks the flag
#[cfg(feature = "async")]
const CANCEL_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);

/// Simple cancellation token shared between the writer and its owner
///
/// The writer checks it between pages and on every pacing poll, never in the
/// middle of copying a page.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Wait until the operation is cancelled
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        // Simple polling; the flag has no waker
        while !self.is_cancelled() {
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
        }
    }
}
