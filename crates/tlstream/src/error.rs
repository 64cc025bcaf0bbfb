//! Error types for the streamer.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use thiserror::Error;
use tlstream_chunker::ChunkError;

/// Errors while reaching the source stream.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source URL could not be parsed
    #[error("Invalid source URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL text
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Only plain HTTP(S) sources are supported
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// HTTP client could not be built
    #[error("HTTP client setup failed: {source}")]
    ClientSetup {
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Connection or request failure
    #[error("Request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying network error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP request failed with status {status} for URL: {url}")]
    HttpStatus {
        /// Status returned by the server
        status: reqwest::StatusCode,
        /// Requested URL
        url: String,
    },
}

/// Errors from a complete streaming run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source could not be opened
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Writing chunks failed
    #[error("Chunk writer error: {0}")]
    Chunk(#[from] ChunkError),

    /// The blocking writer task panicked or was aborted
    #[error("Writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
