//! Ogg error types

use std::fmt;

use thiserror::Error;

/// Part of a page that was being read when the input ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSection {
    /// Fixed 27-byte header following the capture pattern
    Header,
    /// Lacing values, one byte per segment
    SegmentTable,
    /// Page body whose length is the sum of the lacing values
    Payload,
}

impl fmt::Display for PageSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::SegmentTable => "segment table",
            Self::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// Ogg-specific error type
#[derive(Debug, Error)]
pub enum OggError {
    /// The input ended after a capture pattern but before the page was complete
    #[error("truncated page: expected {expected} {section} bytes, got {actual}")]
    Truncated {
        /// Section being read when the input ended
        section: PageSection,
        /// Bytes the section required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Page bytes run past the length declared by the segment table
    #[error("page length mismatch: segment table declares {expected} bytes, got {actual}")]
    TrailingBytes {
        /// Page length implied by the header and segment table
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// A page cannot carry more than 255 lacing values
    #[error("too many segments for one page: {0} (max 255)")]
    TooManySegments(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl OggError {
    /// True when the input stopped in the middle of a page
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Result type for Ogg operations
pub type OggResult<T> = Result<T, OggError>;
