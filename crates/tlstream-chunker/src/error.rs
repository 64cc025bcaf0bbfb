//! Error types for the chunk writer

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tlstream_ogg::OggError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A zero target would rotate after every page, including empty ones
    #[error("target chunk size must be greater than 0")]
    ZeroTargetChunkSize,

    /// Polling without a delay would spin
    #[error("poll interval must be greater than 0")]
    ZeroPollInterval,

    /// A zero timeout would fail the first time the writer gets ahead
    #[error("pace timeout must be greater than 0 when set")]
    ZeroPaceTimeout,
}

/// Chunk writer errors.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Chunk file could not be created or truncated
    #[error("Failed to create chunk file {path}: {source}")]
    CreateChunk {
        /// Chunk file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A chunk left by an earlier run could not be listed or removed
    #[error("Failed to clear stale chunk {path}: {source}")]
    ClearStale {
        /// Chunk file path, or the directory when listing failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing, flushing or syncing a chunk failed
    #[error("Failed to write chunk file {path}: {source}")]
    Write {
        /// Chunk file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Sentinel file could not be created
    #[error("Failed to create sentinel {path}: {source}")]
    Seal {
        /// Sentinel path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The active chunk was already closed
    #[error("Chunk {index:06} is closed")]
    ChunkClosed {
        /// Index of the closed chunk
        index: u64,
    },

    /// Source stream could not be split into pages
    #[error("Page error: {0}")]
    Page(#[from] OggError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The consumer did not catch up within the configured timeout
    #[error("Consumer at chunk {pace} did not catch up with chunk {index} within {waited:?}")]
    PacingTimeout {
        /// Chunk the writer is holding open
        index: u64,
        /// Last pacing marker read
        pace: u64,
        /// Time spent blocked
        waited: Duration,
    },
}

/// Result type for chunk writer operations
pub type ChunkResult<T> = Result<T, ChunkError>;
