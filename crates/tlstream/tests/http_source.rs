//! HTTP source tests against a mock server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use pretty_assertions::assert_eq;
use std::io::{BufReader, Read};
use std::net::TcpListener;
use tlstream::{HttpSource, SourceConfig, SourceError};
use tlstream_chunker::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer, stream_path: &str) -> SourceConfig {
    SourceConfig::parse(&format!("{}{stream_path}", server.uri())).expect("valid mock URL")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_identity_encoding_and_streams_body() {
    let mock_server = MockServer::start().await;
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path("/live.ogg"))
        .and(header("accept-encoding", "identity"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpSource::connect(&source_for(&mock_server, "/live.ogg"))
        .await
        .expect("connect should succeed");
    assert_eq!(source.status(), reqwest::StatusCode::OK);
    assert_eq!(source.content_length(), Some(body.len() as u64));

    let reader = source.into_reader(CancellationToken::new());
    let received = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        BufReader::with_capacity(1024, reader)
            .read_to_end(&mut out)
            .map(|_| out)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(received, body);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.ogg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = HttpSource::connect(&source_for(&mock_server, "/missing.ogg"))
        .await
        .unwrap_err();
    match err {
        SourceError::HttpStatus { status, url } => {
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            assert!(url.ends_with("/missing.ogg"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live.ogg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = HttpSource::connect(&source_for(&mock_server, "/live.ogg")).await;
    assert!(matches!(
        result,
        Err(SourceError::HttpStatus { status, .. }) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = SourceConfig::from_parts("127.0.0.1", port, "/live.ogg").unwrap();
    let err = HttpSource::connect(&config).await.unwrap_err();
    assert!(matches!(err, SourceError::Request { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_reader_reaches_end_of_stream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live.ogg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    let source = HttpSource::connect(&source_for(&mock_server, "/live.ogg"))
        .await
        .unwrap();
    token.cancel();
    let reader = source.into_reader(token);

    let received = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        let mut reader = reader;
        reader.read_to_end(&mut out).map(|_| out)
    })
    .await
    .unwrap()
    .unwrap();

    // Part of the body may have been forwarded before cancellation was seen
    assert!(received.len() <= 4096);
    assert!(received.iter().all(|&b| b == 7));
}
