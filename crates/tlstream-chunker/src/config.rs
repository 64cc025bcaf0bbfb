//! Writer and pacing configuration
//!
//! Defaults: 128 KiB chunks, at most two chunks ahead of the consumer, one chunk of
//! history kept, and the pacing marker polled every 50 ms with no timeout.

use std::time::Duration;

use crate::error::ConfigError;

/// Minimum chunk size before rotation
pub const DEFAULT_TARGET_CHUNK_SIZE: u64 = 1 << 17;

/// Maximum number of chunks the writer may lead the consumer by
pub const DEFAULT_MAX_AHEAD: u64 = 2;

/// Chunks kept on disk behind the consumer's position
pub const DEFAULT_KEEP_HISTORY: u64 = 1;

/// Delay between reads of the pacing marker while blocked
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration shared by the chunk writer and the pacing monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Rotate once the current chunk holds at least this many bytes
    ///
    /// This is a lower bound: rotation only happens on page boundaries, so a
    /// chunk can exceed it by up to one page.
    pub target_chunk_size: u64,

    /// Lead cap: block while `current_index - pace > max_ahead`
    pub max_ahead: u64,

    /// Chunks retained behind the pacing marker
    pub keep_history: u64,

    /// Pacing marker poll interval while blocked
    pub poll_interval: Duration,

    /// Give up waiting for the consumer after this long
    ///
    /// `None` waits indefinitely. A writer with no consumer making progress
    /// then stays blocked until it is cancelled.
    pub pace_timeout: Option<Duration>,

    /// fsync each chunk before its successor is announced
    pub sync_on_seal: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: DEFAULT_TARGET_CHUNK_SIZE,
            max_ahead: DEFAULT_MAX_AHEAD,
            keep_history: DEFAULT_KEEP_HISTORY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            pace_timeout: None,
            sync_on_seal: false,
        }
    }
}

impl ChunkConfig {
    /// Set the target chunk size
    pub fn with_target_chunk_size(mut self, bytes: u64) -> Self {
        self.target_chunk_size = bytes;
        self
    }

    /// Set the lead cap
    pub fn with_max_ahead(mut self, chunks: u64) -> Self {
        self.max_ahead = chunks;
        self
    }

    /// Set the retained history
    pub fn with_keep_history(mut self, chunks: u64) -> Self {
        self.keep_history = chunks;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set or clear the pacing timeout
    pub fn with_pace_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pace_timeout = timeout;
        self
    }

    /// Enable or disable fsync before sealing
    pub fn with_sync_on_seal(mut self, sync: bool) -> Self {
        self.sync_on_seal = sync;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_chunk_size == 0 {
            return Err(ConfigError::ZeroTargetChunkSize);
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }

        if self.pace_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::ZeroPaceTimeout);
        }

        Ok(())
    }
}
