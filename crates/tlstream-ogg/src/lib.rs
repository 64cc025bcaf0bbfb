//! Codec-agnostic Ogg page handling for streamed containers
//!
#![allow(clippy::cast_possible_truncation)] // Lacing values and counts are bounded by the format
#![allow(clippy::doc_markdown)]
//! This crate splits an arbitrary byte stream into complete Ogg pages without
//! interpreting the codec payload. It is the framing layer used by the chunk
//! writer: pages are only ever emitted whole, so anything that copies them
//! verbatim produces output that is itself a valid Ogg stream.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use tlstream_ogg::{OggPageBuilder, PageScanner};
//!
//! # fn main() -> Result<(), tlstream_ogg::OggError> {
//! let page = OggPageBuilder::new(1, 0).packet(b"hello")?.build()?;
//! let mut stream = b"noise".to_vec();
//! stream.extend_from_slice(&page);
//!
//! let mut scanner = PageScanner::new(Cursor::new(stream));
//! let found = scanner.read_page()?.expect("one page");
//! assert_eq!(found.payload(), b"hello");
//! assert!(scanner.read_page()?.is_none());
//! assert_eq!(scanner.stats().skipped_bytes, 5);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod builder;
mod crc;
mod error;
mod header;
mod scanner;

pub use builder::OggPageBuilder;
pub use crc::ogg_crc32;
pub use error::{OggError, OggResult, PageSection};
pub use header::{
    CAPTURE_PATTERN, CHECKSUM_OFFSET, FLAG_CONTINUED, FLAG_FIRST_PAGE, FLAG_LAST_PAGE,
    HEADER_SIZE, MAX_PAGE_SIZE, MAX_SEGMENTS, OggPageHeader,
};
pub use scanner::{OggPage, PageRef, PageScanner, ScanStats};
