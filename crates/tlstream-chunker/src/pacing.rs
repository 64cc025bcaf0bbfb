//! Consumer pacing
//!
//! The consumer reports the chunk it is reading by writing a bare integer to
//! `pacing.txt` in the output directory. The writer polls that file after
//! every rotation: while it is more than `max_ahead` chunks ahead it sleeps,
//! and once it may continue it deletes chunks the consumer has moved past,
//! keeping `keep_history` of them.
//!
//! A missing or unparsable marker means "no consumer yet": the writer then
//! neither blocks nor deletes anything.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::layout::{chunk_path, pacing_path};

/// Read the pacing marker in `dir`
///
/// Returns `None` when the file is missing, unreadable, or does not hold a
/// single non-negative integer.
pub fn read_pace(dir: &Path) -> Option<u64> {
    read_pace_file(&pacing_path(dir))
}

fn read_pace_file(path: &Path) -> Option<u64> {
    let contents = fs::read_to_string(path).ok()?;
    contents.trim().parse().ok()
}

/// Write the pacing marker in `dir` on behalf of a consumer
///
/// The value is written to a temporary file and renamed into place, so the
/// writer never reads a half-written number.
pub fn write_pace(dir: &Path, index: u64) -> io::Result<()> {
    let target = pacing_path(dir);
    let staging = dir.join(".pacing.txt.tmp");
    {
        let mut file = fs::File::create(&staging)?;
        writeln!(file, "{index}")?;
        file.sync_all()?;
    }
    fs::rename(&staging, &target)
}

/// Result of a wait-and-prune pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    /// The writer may continue
    Ready {
        /// Pacing marker seen when unblocked, if any
        pace: Option<u64>,
        /// Chunk files removed during this pass
        deleted: u64,
    },
    /// Cancellation was requested while blocked
    Cancelled,
}

/// Lead-cap enforcement and history pruning for one output directory
#[derive(Debug, Clone)]
pub struct PacingMonitor {
    dir: PathBuf,
    pacing_path: PathBuf,
    max_ahead: u64,
    keep_history: u64,
    poll_interval: Duration,
    pace_timeout: Option<Duration>,
}

impl PacingMonitor {
    /// Create a monitor for `dir`
    pub fn new(dir: impl Into<PathBuf>, config: &ChunkConfig) -> Self {
        let dir = dir.into();
        Self {
            pacing_path: pacing_path(&dir),
            dir,
            max_ahead: config.max_ahead,
            keep_history: config.keep_history,
            poll_interval: config.poll_interval,
            pace_timeout: config.pace_timeout,
        }
    }

    /// Current pacing marker
    pub fn read_pace(&self) -> Option<u64> {
        read_pace_file(&self.pacing_path)
    }

    /// Whether a writer at `index` must wait for a consumer at `pace`
    pub fn is_too_far_ahead(&self, index: u64, pace: u64) -> bool {
        index.saturating_sub(pace) > self.max_ahead
    }

    /// Block while too far ahead of the consumer, then prune old chunks
    ///
    /// `deleted_up_to` is the deletion high-water mark: every chunk below it
    /// has already been removed. It only moves forward.
    pub fn wait_and_prune(
        &self,
        current_index: u64,
        deleted_up_to: &mut u64,
        cancel: &CancellationToken,
    ) -> ChunkResult<PaceOutcome> {
        let started = Instant::now();
        let mut blocked = false;

        let pace = loop {
            match self.read_pace() {
                Some(pace) if self.is_too_far_ahead(current_index, pace) => {
                    if cancel.is_cancelled() {
                        debug!(index = current_index, pace, "cancelled while waiting for consumer");
                        return Ok(PaceOutcome::Cancelled);
                    }

                    let waited = started.elapsed();
                    if let Some(timeout) = self.pace_timeout
                        && waited >= timeout
                    {
                        return Err(ChunkError::PacingTimeout {
                            index: current_index,
                            pace,
                            waited,
                        });
                    }

                    if !blocked {
                        debug!(
                            index = current_index,
                            pace,
                            max_ahead = self.max_ahead,
                            "writer ahead of consumer, waiting"
                        );
                        blocked = true;
                    }
                    thread::sleep(self.poll_interval);
                }
                other => break other,
            }
        };

        if blocked {
            debug!(index = current_index, waited = ?started.elapsed(), "consumer caught up");
        }

        let deleted = match pace {
            Some(pace) => self.prune(current_index, pace, deleted_up_to),
            None => 0,
        };

        Ok(PaceOutcome::Ready { pace, deleted })
    }

    /// Delete chunks below `pace - keep_history`, never touching the active chunk
    fn prune(&self, current_index: u64, pace: u64, deleted_up_to: &mut u64) -> u64 {
        let Some(limit) = pace.checked_sub(self.keep_history) else {
            return 0;
        };
        let limit = limit.min(current_index);
        if limit <= *deleted_up_to {
            return 0;
        }

        let mut deleted = 0;
        for index in *deleted_up_to..limit {
            let path = chunk_path(&self.dir, index);
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to delete consumed chunk");
                }
            }
        }

        debug!(from = *deleted_up_to, to = limit, deleted, "pruned consumed chunks");
        *deleted_up_to = limit;
        deleted
    }
}
