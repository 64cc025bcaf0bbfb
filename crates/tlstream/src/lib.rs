//! Live Ogg stream to paced chunk files
//!
//! `tlstream` fetches an Ogg stream over HTTP and hands it to
//! [`tlstream_chunker::ChunkWriter`], which cuts it into page-aligned
//! `NNNNNN.raw` files and paces itself against a consumer's `pacing.txt`.
//!
//! The binary in `bin/tlstream.rs` is a thin wrapper around [`pipeline::run`]
//! configured by [`StreamerConfig`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tlstream::{SourceConfig, pipeline};
//! use tlstream_chunker::{CancellationToken, ChunkConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = SourceConfig::from_parts("radio.local", 8000, "/live.ogg")?;
//! let summary = pipeline::run(
//!     &source,
//!     Path::new("out"),
//!     ChunkConfig::default(),
//!     CancellationToken::new(),
//! )
//! .await?;
//! println!("last chunk {}", summary.last_index);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;

pub use config::{LogFormat, StreamerConfig};
pub use error::{PipelineError, SourceError};
pub use source::{BodyReader, HttpSource, SourceConfig};
