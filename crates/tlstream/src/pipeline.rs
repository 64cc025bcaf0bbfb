//! Source-to-chunks pipeline
//!
//! Connects to the source, then runs the synchronous [`ChunkWriter`] on a
//! blocking thread fed by the forwarded response body.

use std::io::BufReader;
use std::path::Path;

use tlstream_chunker::{CancellationToken, ChunkConfig, ChunkWriter, WriteSummary};
use tracing::info;

use crate::error::PipelineError;
use crate::source::{HttpSource, SourceConfig};

/// Stream `source` into chunk files under `out_dir` until it ends
///
/// Cancelling `cancel` stops the body and finishes the run at the next page
/// boundary, leaving the end-of-stream sentinel as for a normal end.
///
/// # Errors
///
/// Returns `PipelineError` if the source cannot be opened, the output cannot
/// be written, or the stream is cut off in the middle of a page.
pub async fn run(
    source: &SourceConfig,
    out_dir: &Path,
    chunk_config: ChunkConfig,
    cancel: CancellationToken,
) -> Result<WriteSummary, PipelineError> {
    let http = HttpSource::connect(source).await?;
    let writer = ChunkWriter::open(out_dir, chunk_config)?.with_cancellation(cancel.clone());

    info!(
        url = %source.url,
        out_dir = %out_dir.display(),
        "streaming into chunks"
    );

    let reader = BufReader::with_capacity(source.read_buffer_size, http.into_reader(cancel));
    let summary = tokio::task::spawn_blocking(move || writer.run(reader)).await??;
    Ok(summary)
}
