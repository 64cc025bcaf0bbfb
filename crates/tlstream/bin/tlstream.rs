//! tlstream binary entry point.
//!
//! Thin wrapper around the tlstream library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Streams the source into chunk files until it ends or a signal arrives
//!
//! Usage: `tlstream <HOST> <PORT> <PATH> <OUT_DIR> [OPTIONS]`

use anyhow::{Context, Result};
use tlstream::{LogFormat, StreamerConfig, pipeline};
use tlstream_chunker::{CancellationToken, RunOutcome, list_chunks};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = StreamerConfig::from_args();
    init_tracing(config.log_format);

    tracing::info!("tlstream starting...");
    config.validate()?;

    let source = config.source_config()?;
    let chunk_config = config.chunk_config();
    tracing::info!(
        url = %source.url,
        out_dir = %config.out_dir.display(),
        target_chunk_size = chunk_config.target_chunk_size,
        max_ahead = chunk_config.max_ahead,
        keep_history = chunk_config.keep_history,
        "configuration loaded"
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown requested, finishing at the next page boundary");
        signal_token.cancel();
    });

    let summary = pipeline::run(&source, &config.out_dir, chunk_config, cancel)
        .await
        .context("streaming failed")?;

    let on_disk = list_chunks(&config.out_dir)
        .with_context(|| format!("failed to list {}", config.out_dir.display()))?;
    let outcome = match summary.outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Cancelled => "cancelled",
    };
    tracing::info!(
        outcome,
        last_index = summary.last_index,
        sentinel_index = summary.sentinel_index,
        pages = summary.pages,
        bytes = summary.total_bytes,
        skipped_bytes = summary.skipped_bytes,
        chunks_on_disk = on_disk.len(),
        retained_bytes = on_disk.iter().map(|entry| entry.len).sum::<u64>(),
        "stream finished"
    );

    Ok(())
}
