//! Streamer configuration management.
//!
//! Configuration is loaded from positional CLI arguments (source host, port,
//! path and output directory) plus optional flags that can also be supplied
//! through `TLSTREAM_*` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use tlstream::StreamerConfig;
//!
//! let config = StreamerConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Writing chunks to: {}", config.out_dir.display());
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tlstream_chunker::config::{DEFAULT_KEEP_HISTORY, DEFAULT_MAX_AHEAD, DEFAULT_TARGET_CHUNK_SIZE};
use tlstream_chunker::{ChunkConfig, ConfigError};

use crate::error::SourceError;
use crate::source::{DEFAULT_READ_BUFFER_SIZE, SourceConfig};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Streamer configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tlstream",
    about = "Persist a live Ogg stream as paced, page-aligned chunk files",
    version
)]
pub struct StreamerConfig {
    /// Source host name or address
    pub host: String,

    /// Source port
    pub port: u16,

    /// Request path on the source, e.g. /live.ogg
    pub path: String,

    /// Directory receiving the chunk files and read for pacing.txt
    pub out_dir: PathBuf,

    /// Minimum chunk size in bytes before rotating
    #[arg(
        long,
        env = "TLSTREAM_TARGET_CHUNK_SIZE",
        default_value_t = DEFAULT_TARGET_CHUNK_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub target_chunk_size: u64,

    /// Chunks the writer may lead the consumer by
    #[arg(long, env = "TLSTREAM_MAX_AHEAD", default_value_t = DEFAULT_MAX_AHEAD)]
    pub max_ahead: u64,

    /// Chunks kept behind the consumer's position
    #[arg(long, env = "TLSTREAM_KEEP_HISTORY", default_value_t = DEFAULT_KEEP_HISTORY)]
    pub keep_history: u64,

    /// Pacing marker poll interval in milliseconds
    #[arg(
        long,
        env = "TLSTREAM_POLL_INTERVAL_MS",
        default_value_t = 50,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Give up when the consumer stalls this long (waits forever if unset)
    #[arg(
        long,
        env = "TLSTREAM_PACE_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub pace_timeout_secs: Option<u64>,

    /// fsync each chunk before the next one is announced
    #[arg(long, env = "TLSTREAM_SYNC_ON_SEAL")]
    pub sync_on_seal: bool,

    /// Read buffer size in bytes in front of the page scanner
    #[arg(
        long,
        env = "TLSTREAM_READ_BUFFER_SIZE",
        default_value_t = DEFAULT_READ_BUFFER_SIZE as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_buffer_size: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "TLSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "TLSTREAM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl StreamerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Writer and pacing settings.
    #[must_use]
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig::default()
            .with_target_chunk_size(self.target_chunk_size)
            .with_max_ahead(self.max_ahead)
            .with_keep_history(self.keep_history)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_pace_timeout(self.pace_timeout_secs.map(Duration::from_secs))
            .with_sync_on_seal(self.sync_on_seal)
    }

    /// Source URL and connection settings.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if host, port and path do not form a valid URL.
    pub fn source_config(&self) -> Result<SourceConfig, SourceError> {
        let mut source = SourceConfig::from_parts(&self.host, self.port, &self.path)?;
        source.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        source.read_buffer_size = usize::try_from(self.read_buffer_size).unwrap_or(usize::MAX);
        Ok(source)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the writer settings are unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunk_config().validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments_and_defaults() {
        let config =
            StreamerConfig::try_parse_from(["tlstream", "radio.local", "8000", "/live.ogg", "out"])
                .unwrap();

        assert_eq!(config.host, "radio.local");
        assert_eq!(config.port, 8000);
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.chunk_config(), ChunkConfig::default());
        assert!(config.validate().is_ok());

        let source = config.source_config().unwrap();
        assert_eq!(source.url.as_str(), "http://radio.local:8000/live.ogg");
        assert_eq!(source.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(source.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = StreamerConfig::try_parse_from([
            "tlstream",
            "127.0.0.1",
            "9000",
            "stream",
            "/var/tl",
            "--target-chunk-size",
            "4096",
            "--max-ahead",
            "5",
            "--keep-history",
            "0",
            "--poll-interval-ms",
            "20",
            "--pace-timeout-secs",
            "30",
            "--sync-on-seal",
            "--log-format",
            "json",
        ])
        .unwrap();

        let chunk = config.chunk_config();
        assert_eq!(chunk.target_chunk_size, 4096);
        assert_eq!(chunk.max_ahead, 5);
        assert_eq!(chunk.keep_history, 0);
        assert_eq!(chunk.poll_interval, Duration::from_millis(20));
        assert_eq!(chunk.pace_timeout, Some(Duration::from_secs(30)));
        assert!(chunk.sync_on_seal);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.source_config().unwrap().url.as_str(),
            "http://127.0.0.1:9000/stream"
        );
    }

    #[test]
    fn test_rejects_invalid_values() {
        let base = ["tlstream", "radio.local", "8000", "/live.ogg", "out"];

        let zero_target = base.iter().copied().chain(["--target-chunk-size", "0"]);
        assert!(StreamerConfig::try_parse_from(zero_target).is_err());

        let zero_poll = base.iter().copied().chain(["--poll-interval-ms", "0"]);
        assert!(StreamerConfig::try_parse_from(zero_poll).is_err());

        assert!(
            StreamerConfig::try_parse_from(["tlstream", "radio.local", "99999", "/", "out"])
                .is_err()
        );
        assert!(StreamerConfig::try_parse_from(["tlstream", "radio.local", "8000"]).is_err());
    }
}
