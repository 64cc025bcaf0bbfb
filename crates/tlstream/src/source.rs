//! HTTP source stream
//!
//! Opens the container stream with a single GET and exposes the response
//! body as a blocking [`Read`], so the synchronous chunk writer can run on a
//! blocking thread while the body is pulled by the async runtime.
//!
//! The body is requested with `Accept-Encoding: identity` and the client's
//! content decoders are disabled: the bytes on disk must be the bytes the
//! server sent.

use std::io::{self, Read};
use std::time::Duration;

use bytes::{Buf, Bytes};
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::ACCEPT_ENCODING;
use tlstream_chunker::CancellationToken;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SourceError;

/// Buffer size of the reader handed to the page scanner
pub const DEFAULT_READ_BUFFER_SIZE: usize = 32 * 1024;

/// Body chunks buffered between the network task and the writer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Timeout for establishing the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Install the ring crypto provider for rustls (idempotent)
fn ensure_crypto_provider() {
    // Fails only when a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Where and how to fetch the source stream
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Stream URL
    pub url: Url,
    /// Connection timeout; there is no overall timeout for a live stream
    pub connect_timeout: Duration,
    /// Capacity of the buffered reader in front of the page scanner
    pub read_buffer_size: usize,
    /// Body chunks in flight between the network and the writer
    pub channel_capacity: usize,
    /// User-Agent header
    pub user_agent: String,
}

impl SourceConfig {
    /// Configuration for `url` with default settings
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            user_agent: format!("tlstream/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Parse and check an http(s) URL
    pub fn parse(url: &str) -> Result<Self, SourceError> {
        let parsed = Url::parse(url).map_err(|source| SourceError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self::new(parsed)),
            other => Err(SourceError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Build an `http://host:port/path` source
    pub fn from_parts(host: &str, port: u16, path: &str) -> Result<Self, SourceError> {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let separator = if path.starts_with('/') { "" } else { "/" };
        Self::parse(&format!("http://{host}:{port}{separator}{path}"))
    }
}

/// An open HTTP response carrying the container stream
#[derive(Debug)]
pub struct HttpSource {
    response: reqwest::Response,
    url: Url,
    channel_capacity: usize,
}

impl HttpSource {
    /// Send the GET request and check the response status
    ///
    /// Any non-2xx status is an error; nothing is retried.
    pub async fn connect(config: &SourceConfig) -> Result<Self, SourceError> {
        ensure_crypto_provider();
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()
            .map_err(|source| SourceError::ClientSetup { source })?;

        debug!(url = %config.url, "requesting source stream");
        let response = client
            .get(config.url.clone())
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: config.url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status,
                url: config.url.to_string(),
            });
        }

        info!(
            url = %config.url,
            status = %status,
            content_length = ?response.content_length(),
            "connected to source"
        );

        Ok(Self {
            response,
            url: config.url.clone(),
            channel_capacity: config.channel_capacity.max(1),
        })
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Declared body length, if any; live streams usually have none
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Start forwarding the body and return a blocking reader over it
    ///
    /// Must be called from within a Tokio runtime. The reader must be used
    /// from a blocking context (for example `spawn_blocking`). Once `cancel`
    /// fires the body stops flowing and the reader sees end of stream.
    pub fn into_reader(self, cancel: CancellationToken) -> BodyReader {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let Self { response, url, .. } = self;

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut forwarded = 0u64;
            loop {
                let item = tokio::select! {
                    item = body.next() => item,
                    () = cancel.cancelled() => {
                        debug!(url = %url, forwarded, "source forwarding cancelled");
                        break;
                    }
                };
                let Some(item) = item else {
                    debug!(url = %url, forwarded, "source stream ended");
                    break;
                };

                let item = item.map_err(|err| {
                    warn!(url = %url, error = %err, "source stream failed");
                    io::Error::other(err)
                });
                let failed = item.is_err();
                if let Ok(chunk) = &item {
                    forwarded += chunk.len() as u64;
                }
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        BodyReader {
            rx,
            current: Bytes::new(),
            done: false,
        }
    }
}

/// Blocking reader over a response body forwarded through a channel
#[derive(Debug)]
pub struct BodyReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
    done: bool,
}

impl BodyReader {
    /// Reader over an existing channel of body chunks
    pub fn from_channel(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
            done: false,
        }
    }
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            if self.done {
                return Ok(0);
            }
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(err)) => {
                    self.done = true;
                    return Err(err);
                }
                None => self.done = true,
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}
