//! End-to-end tests: mock HTTP source into chunk files.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tlstream::{PipelineError, SourceConfig, SourceError, pipeline};
use tlstream_chunker::{
    CancellationToken, ChunkConfig, ChunkError, RunOutcome, chunk_path, list_chunks,
};
use tlstream_ogg::{OggError, OggPageBuilder};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ogg_stream(sizes: &[usize]) -> Vec<u8> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(seq, &size)| {
            OggPageBuilder::new(0x51, seq as u32)
                .packet(&vec![seq as u8; size])
                .expect("packet fits in one page")
                .build()
                .expect("page builds")
        })
        .collect()
}

async fn serve(body: Vec<u8>) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live.ogg"))
        .and(header("accept-encoding", "identity"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&mock_server)
        .await;
    mock_server
}

fn source(server: &MockServer) -> SourceConfig {
    let mut config = SourceConfig::parse(&format!("{}/live.ogg", server.uri())).unwrap();
    config.read_buffer_size = 512;
    config
}

fn chunk_config(target: u64) -> ChunkConfig {
    ChunkConfig::default()
        .with_target_chunk_size(target)
        .with_poll_interval(Duration::from_millis(5))
}

fn reassemble(dir: &Path, last: u64) -> Vec<u8> {
    (0..=last)
        .flat_map(|index| fs::read(chunk_path(dir, index)).unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stream_is_persisted_as_chunks() {
    let body = ogg_stream(&[1500, 200, 3000, 40, 2200, 900, 0, 1800]);
    let mock_server = serve(body.clone()).await;
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("chunks");

    let summary = pipeline::run(
        &source(&mock_server),
        &out_dir,
        chunk_config(2048),
        CancellationToken::new(),
    )
    .await
    .expect("pipeline should succeed");

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.pages, 8);
    assert_eq!(summary.total_bytes, body.len() as u64);
    assert!(summary.rotations > 0);
    assert_eq!(reassemble(&out_dir, summary.last_index), body);

    let chunks = list_chunks(&out_dir).unwrap();
    let last = chunks.last().unwrap();
    assert_eq!(last.index, summary.sentinel_index);
    assert!(last.is_sentinel());
    assert_eq!(chunks.len() as u64, summary.sentinel_index + 1);
}

#[tokio::test]
async fn test_failed_request_creates_no_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("chunks");

    let err = pipeline::run(
        &source(&mock_server),
        &out_dir,
        ChunkConfig::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Source(SourceError::HttpStatus { .. })
    ));
    assert!(!out_dir.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_truncated_stream_fails_without_sentinel() {
    let complete = ogg_stream(&[700, 700]);
    let partial = ogg_stream(&[500]);
    let mut body = complete.clone();
    body.extend_from_slice(&partial[..partial.len() - 100]);

    let mock_server = serve(body).await;
    let temp_dir = TempDir::new().unwrap();

    let err = pipeline::run(
        &source(&mock_server),
        temp_dir.path(),
        chunk_config(1 << 20),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Chunk(ChunkError::Page(OggError::Truncated { .. }))
    ));
    assert_eq!(fs::read(chunk_path(temp_dir.path(), 0)).unwrap(), complete);
    assert!(!chunk_path(temp_dir.path(), 1).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_run_still_leaves_sentinel() {
    let mock_server = serve(ogg_stream(&[100, 100, 100])).await;
    let temp_dir = TempDir::new().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let summary = pipeline::run(
        &source(&mock_server),
        temp_dir.path(),
        ChunkConfig::default(),
        token,
    )
    .await
    .unwrap();

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.pages, 0);
    assert_eq!(summary.sentinel_index, 1);
    assert_eq!(fs::metadata(chunk_path(temp_dir.path(), 1)).unwrap().len(), 0);
}
