//! Chunk writer
//!
//! Pulls pages from a [`PageScanner`] into numbered chunk files, rotating to
//! the next file once the current one has reached the target size. Rotation
//! only happens between pages, so every chunk holds whole pages.
//!
//! Readers discover progress from the directory alone:
//! - a chunk is complete once a file with the next index exists, because the
//!   writer closes a chunk before it creates its successor;
//! - an empty file at `last + 1` that never gains content marks the end of
//!   the stream.

use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use tlstream_ogg::{PageScanner, ScanStats};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::layout::{chunk_path, list_chunks};
use crate::pacing::{PaceOutcome, PacingMonitor};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Source reached end of stream between pages
    Completed,
    /// Cancellation was requested; the stream was sealed at the last whole page
    Cancelled,
}

/// Writer-local counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterState {
    /// Index of the chunk being written
    pub index: u64,
    /// Bytes written to the current chunk
    pub written: u64,
    /// Deletion high-water mark: chunks below it have been removed
    pub deleted_up_to: u64,
    /// Bytes written across all chunks
    pub total_bytes: u64,
    /// Pages written across all chunks
    pub pages: u64,
    /// Completed rotations
    pub rotations: u64,
}

impl WriterState {
    fn record_page(&mut self, len: u64) {
        self.written += len;
        self.total_bytes += len;
        self.pages += 1;
    }

    fn advance(&mut self) {
        self.index += 1;
        self.written = 0;
        self.rotations += 1;
    }
}

/// Summary returned by [`ChunkWriter::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Index of the last chunk holding (or able to hold) data
    pub last_index: u64,
    /// Index of the permanent end-of-stream sentinel
    pub sentinel_index: u64,
    /// Page bytes written
    pub total_bytes: u64,
    /// Pages written
    pub pages: u64,
    /// Rotations performed
    pub rotations: u64,
    /// Deletion high-water mark at the end of the run
    pub deleted_up_to: u64,
    /// Noise bytes skipped while looking for pages
    pub skipped_bytes: u64,
    /// Why the run stopped
    pub outcome: RunOutcome,
}

/// An open chunk file
struct ChunkFile {
    path: PathBuf,
    out: BufWriter<File>,
}

impl ChunkFile {
    fn create(dir: &Path, index: u64) -> ChunkResult<Self> {
        let path = chunk_path(dir, index);
        let file = File::create(&path).map_err(|source| ChunkError::CreateChunk {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
        })
    }

    fn write_page(&mut self, bytes: &[u8]) -> ChunkResult<()> {
        self.out
            .write_all(bytes)
            .map_err(|source| ChunkError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush and close, optionally syncing to stable storage first
    fn close(self, sync: bool) -> ChunkResult<()> {
        let Self { path, out } = self;
        let file = out.into_inner().map_err(|err| ChunkError::Write {
            path: path.clone(),
            source: err.into_error(),
        })?;
        if sync {
            file.sync_all()
                .map_err(|source| ChunkError::Write { path, source })?;
        }
        Ok(())
    }
}

/// Create an empty sentinel file at `index`
fn seal(dir: &Path, index: u64) -> ChunkResult<()> {
    let path = chunk_path(dir, index);
    File::create(&path)
        .map(drop)
        .map_err(|source| ChunkError::Seal { path, source })
}

/// Remove every chunk file already in `dir`, returning how many went
fn clear_stale_chunks(dir: &Path) -> ChunkResult<u64> {
    let entries = list_chunks(dir).map_err(|source| ChunkError::ClearStale {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries {
        match fs::remove_file(&entry.path) {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ChunkError::ClearStale {
                    path: entry.path,
                    source,
                });
            }
        }
    }
    Ok(removed)
}

/// Splits a page stream into size-bounded chunk files
pub struct ChunkWriter {
    dir: PathBuf,
    config: ChunkConfig,
    current: Option<ChunkFile>,
    state: WriterState,
    pacing: PacingMonitor,
    cancel: CancellationToken,
}

impl ChunkWriter {
    /// Create the output directory if needed and open chunk 0
    ///
    /// Chunk files left by an earlier run are removed first, so a reader can
    /// never mistake them for progress of this run. `pacing.txt` belongs to
    /// the consumer and is left alone.
    pub fn open(dir: impl Into<PathBuf>, config: ChunkConfig) -> ChunkResult<Self> {
        config.validate()?;
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|source| ChunkError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let stale = clear_stale_chunks(&dir)?;
        if stale > 0 {
            info!(dir = %dir.display(), removed = stale, "removed chunks from an earlier run");
        }
        let current = ChunkFile::create(&dir, 0)?;

        info!(
            dir = %dir.display(),
            target_chunk_size = config.target_chunk_size,
            max_ahead = config.max_ahead,
            keep_history = config.keep_history,
            "chunk writer opened"
        );

        Ok(Self {
            pacing: PacingMonitor::new(dir.clone(), &config),
            dir,
            config,
            current: Some(current),
            state: WriterState::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` to stop the writer between pages
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Index of the chunk currently open
    pub fn current_index(&self) -> u64 {
        self.state.index
    }

    /// Writer counters
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Copy pages from `source` into chunk files until end of stream
    ///
    /// On end of stream or cancellation the last chunk is closed and the
    /// permanent sentinel is created. Any other failure is returned as is;
    /// bytes of a page that was cut short are never written.
    pub fn run<R: BufRead>(mut self, source: R) -> ChunkResult<WriteSummary> {
        let mut scanner = PageScanner::new(source);
        let mut skipped = 0;

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }

            let page = match scanner.read_page() {
                Ok(Some(page)) => page,
                Ok(None) if self.cancel.is_cancelled() => break RunOutcome::Cancelled,
                Ok(None) => break RunOutcome::Completed,
                Err(err) if self.cancel.is_cancelled() => {
                    warn!(index = self.state.index, error = %err, "discarding page interrupted by cancellation");
                    break RunOutcome::Cancelled;
                }
                Err(err) => return Err(err.into()),
            };
            let len = page.len() as u64;
            self.current_mut()?.write_page(page.as_bytes())?;
            self.state.record_page(len);

            let stats = scanner.stats();
            if stats.skipped_bytes > skipped {
                warn!(
                    skipped = stats.skipped_bytes - skipped,
                    page = stats.pages,
                    "resynchronised on capture pattern"
                );
                skipped = stats.skipped_bytes;
            }

            if self.state.written >= self.config.target_chunk_size
                && self.rotate()? == PaceOutcome::Cancelled
            {
                break RunOutcome::Cancelled;
            }
        };

        self.finalize(outcome, scanner.stats())
    }

    fn current_mut(&mut self) -> ChunkResult<&mut ChunkFile> {
        let index = self.state.index;
        self.current
            .as_mut()
            .ok_or(ChunkError::ChunkClosed { index })
    }

    fn close_current(&mut self) -> ChunkResult<()> {
        match self.current.take() {
            Some(file) => file.close(self.config.sync_on_seal),
            None => Ok(()),
        }
    }

    /// Close the full chunk, reserve and open the next one, then pace
    fn rotate(&mut self) -> ChunkResult<PaceOutcome> {
        self.close_current()?;
        seal(&self.dir, self.state.index + 1)?;

        let finished = self.state.index;
        let size = self.state.written;
        self.state.advance();
        self.current = Some(ChunkFile::create(&self.dir, self.state.index)?);
        debug!(chunk = finished, size, next = self.state.index, "rotated chunk");

        self.pacing.wait_and_prune(
            self.state.index,
            &mut self.state.deleted_up_to,
            &self.cancel,
        )
    }

    /// Close the last chunk and leave the end-of-stream sentinel behind it
    fn finalize(mut self, outcome: RunOutcome, stats: ScanStats) -> ChunkResult<WriteSummary> {
        self.close_current()?;
        let sentinel_index = self.state.index + 1;
        seal(&self.dir, sentinel_index)?;

        let summary = WriteSummary {
            last_index: self.state.index,
            sentinel_index,
            total_bytes: self.state.total_bytes,
            pages: self.state.pages,
            rotations: self.state.rotations,
            deleted_up_to: self.state.deleted_up_to,
            skipped_bytes: stats.skipped_bytes,
            outcome,
        };

        info!(
            last_index = summary.last_index,
            pages = summary.pages,
            bytes = summary.total_bytes,
            rotations = summary.rotations,
            outcome = ?summary.outcome,
            "stream sealed"
        );

        Ok(summary)
    }
}
