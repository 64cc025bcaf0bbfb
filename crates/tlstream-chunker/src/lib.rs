//! Page-aligned chunk files with file-based consumer pacing
//!
//! This crate persists a live Ogg stream as a sequence of numbered chunk
//! files so that an independent consumer can follow it at its own pace:
//!
//! - `writer`: [`ChunkWriter`] pulls whole pages into `NNNNNN.raw` files and
//!   rotates once a chunk reaches the target size
//! - `pacing`: [`PacingMonitor`] blocks the writer while it is too far ahead
//!   of the consumer's `pacing.txt` marker and deletes consumed chunks
//! - `layout`: file naming and directory listing
//! - `config`: tunables, with defaults and validation
//!
//! The only coordination with the consumer is through the output directory:
//! the writer never splits a page across files, announces a new chunk only
//! after the previous one is closed, and leaves an empty sentinel file after
//! the last chunk when the stream ends.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use tlstream_chunker::{ChunkConfig, ChunkWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = BufReader::new(File::open("capture.ogg")?);
//! let writer = ChunkWriter::open("out", ChunkConfig::default())?;
//! let summary = writer.run(source)?;
//! println!("{} chunks, sentinel at {}", summary.last_index + 1, summary.sentinel_index);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cancel;
pub mod config;
pub mod error;
pub mod layout;
pub mod pacing;
pub mod writer;

pub use cancel::CancellationToken;
pub use config::ChunkConfig;
pub use error::{ChunkError, ChunkResult, ConfigError};
pub use layout::{ChunkEntry, chunk_file_name, chunk_path, list_chunks, pacing_path};
pub use pacing::{PaceOutcome, PacingMonitor, read_pace, write_pace};
pub use writer::{ChunkWriter, RunOutcome, WriteSummary, WriterState};
