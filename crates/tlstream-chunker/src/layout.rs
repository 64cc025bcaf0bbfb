//! On-disk layout of the output directory
//!
//! ```text
//! out_dir/
//!   000000.raw    chunk 0 (whole pages)
//!   000001.raw    chunk 1
//!   000002.raw    empty: reserved for the next chunk, or end of stream
//!   pacing.txt    consumer's current chunk index, written by the consumer
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of chunk files
pub const CHUNK_EXTENSION: &str = "raw";

/// Zero-padded width of the chunk index in file names
pub const CHUNK_INDEX_WIDTH: usize = 6;

/// File the consumer writes its position to
pub const PACING_FILE_NAME: &str = "pacing.txt";

/// File name for a chunk index
///
/// Indices wider than six digits are written in full.
pub fn chunk_file_name(index: u64) -> String {
    format!("{index:0width$}.{CHUNK_EXTENSION}", width = CHUNK_INDEX_WIDTH)
}

/// Path of a chunk file inside `dir`
pub fn chunk_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(chunk_file_name(index))
}

/// Path of the pacing marker inside `dir`
pub fn pacing_path(dir: &Path) -> PathBuf {
    dir.join(PACING_FILE_NAME)
}

/// Parse a chunk index back out of a file name
pub fn parse_chunk_file_name(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(CHUNK_EXTENSION)?.strip_suffix('.')?;
    if stem.len() < CHUNK_INDEX_WIDTH || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// A chunk file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Chunk index
    pub index: u64,
    /// Full path
    pub path: PathBuf,
    /// Size in bytes at listing time; zero for sentinels
    pub len: u64,
}

impl ChunkEntry {
    /// Empty files are sentinels (reserved or end of stream)
    pub fn is_sentinel(&self) -> bool {
        self.len == 0
    }
}

/// List chunk files in `dir`, ordered by index
pub fn list_chunks(dir: &Path) -> io::Result<Vec<ChunkEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(index) = entry.file_name().to_str().and_then(parse_chunk_file_name) else {
            continue;
        };
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        entries.push(ChunkEntry {
            index,
            path: entry.path(),
            len: metadata.len(),
        });
    }
    entries.sort_by_key(|entry| entry.index);
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name(0), "000000.raw");
        assert_eq!(chunk_file_name(42), "000042.raw");
        assert_eq!(chunk_file_name(1_234_567), "1234567.raw");
    }

    #[test]
    fn test_parse_chunk_file_name() {
        assert_eq!(parse_chunk_file_name("000000.raw"), Some(0));
        assert_eq!(parse_chunk_file_name("000042.raw"), Some(42));
        assert_eq!(parse_chunk_file_name("1234567.raw"), Some(1_234_567));
        assert_eq!(parse_chunk_file_name("42.raw"), None);
        assert_eq!(parse_chunk_file_name("00004a.raw"), None);
        assert_eq!(parse_chunk_file_name("000042.ogg"), None);
        assert_eq!(parse_chunk_file_name("000042raw"), None);
        assert_eq!(parse_chunk_file_name(PACING_FILE_NAME), None);
    }

    #[test]
    fn test_list_chunks_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(chunk_path(dir.path(), 2), b"").unwrap();
        fs::write(chunk_path(dir.path(), 0), b"abc").unwrap();
        fs::write(chunk_path(dir.path(), 1), b"de").unwrap();
        fs::write(pacing_path(dir.path()), b"1").unwrap();
        fs::create_dir(dir.path().join("000009.raw")).unwrap();

        let chunks = list_chunks(dir.path()).unwrap();
        let summary: Vec<(u64, u64)> = chunks.iter().map(|c| (c.index, c.len)).collect();
        assert_eq!(summary, vec![(0, 3), (1, 2), (2, 0)]);
        assert!(chunks[2].is_sentinel());
        assert!(!chunks[0].is_sentinel());
    }
}
