//! Main entry point for the rangeserve CLI application.
//!
//! This binary plans a ranged response for a local file or an HTTP URL,
//! prints the status line and headers, and streams the body to stdout or a
//! file, the way an HTTP server would write it to the wire.

use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::header::CONTENT_LENGTH;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use rangeserve::log::configure_logger;
use rangeserve::{ChunkEvent, ChunkNotifier, Cli, RangedResponse, Resource, TracingNotifier};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logger(cli.verbose, cli.is_quiet())?;

    // Fails fast on unsupported schemes, before anything is opened
    let resource = Resource::parse(&cli.source)?;

    let notifier: Arc<dyn ChunkNotifier> = if cli.events {
        Arc::new(|event: &ChunkEvent| {
            if let Ok(line) = serde_json::to_string(event) {
                eprintln!("{}", line);
            }
        })
    } else {
        Arc::new(TracingNotifier)
    };

    let response = RangedResponse::open(
        &resource,
        &cli.http_config(),
        cli.range.as_deref(),
        &cli.stream_config(),
        notifier,
    )
    .await
    .with_context(|| format!("failed to open {}", cli.source))?;

    if !cli.is_quiet() {
        eprintln!("HTTP {}", response.status().code());
        for (name, value) in response.headers() {
            eprintln!("{}: {}", name, value);
        }
    }

    let expected = response
        .plan()
        .header(&CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok());

    let written = match cli.output {
        Some(ref path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path))?;
            write_body(response, &mut file).await?
        }
        None => write_body(response, &mut tokio::io::stdout()).await?,
    };

    // The headers promised a length; a short body is a failed response
    if let Some(expected) = expected {
        if written != expected {
            bail!(
                "response body truncated: sent {} of {} bytes",
                format_size(written),
                format_size(expected)
            );
        }
    }

    if !cli.is_quiet() {
        eprintln!("Sent {}", format_size(written));
    }

    Ok(())
}

/// Stream every block of the response into `out`.
///
/// Returns the number of bytes written. A source failure aborts the body
/// midway; whatever was already written stays written.
async fn write_body<W: AsyncWrite + Unpin>(mut response: RangedResponse, out: &mut W) -> Result<u64> {
    let mut written = 0u64;
    while let Some(block) = response
        .next_block()
        .await
        .with_context(|| format!("source failed after {} bytes", written))?
    {
        out.write_all(&block).await?;
        written += block.len() as u64;
    }
    out.flush().await?;
    Ok(written)
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
