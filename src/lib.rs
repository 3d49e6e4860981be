//! # rangeserve
//!
//! Byte-range (`206 Partial Content`) streaming for large media resources.
//!
//! The crate parses a request's `Range` header, decides between a full (200),
//! partial (206) or unsatisfiable (416) response against the real resource
//! size, and streams the body in bounded blocks from either a local file or a
//! remote blob fetched as a chunked download. Every block, and every response,
//! is reported to an injected [`ChunkNotifier`] for analytics.
//!
//! ## Features
//!
//! - `Range: bytes=N-M`, `bytes=N-` and `bytes=-K` (first range only)
//! - Local sources over any seekable async stream
//! - Remote sources whose size is only learned from the first chunk
//! - Optional cap on the bytes served by one partial response
//! - Per-block and per-response progress events
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use rangeserve::{RangedResponse, StreamConfig, TracingNotifier};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StreamConfig::with_source_id("episode-42");
//!     let mut response = RangedResponse::from_path(
//!         Path::new("episode-42.mp3"),
//!         Some("bytes=0-1023"),
//!         &config,
//!         Arc::new(TracingNotifier),
//!     )
//!     .await?;
//!
//!     println!("{}", response.status().code());
//!     for (name, value) in response.headers() {
//!         println!("{}: {}", name, value);
//!     }
//!     while let Some(block) = response.next_block().await? {
//!         println!("{} bytes", block.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod io;
pub mod log;
pub mod range;
pub mod response;

pub use cli::Cli;
pub use config::{HttpConfig, StreamConfig};
pub use error::{RangedError, Result};
pub use event::{ChannelNotifier, ChunkEvent, ChunkNotifier, NoopNotifier, TracingNotifier};
pub use io::{
    ChunkSource, ChunkTransport, HttpChunkTransport, LocalChunkSource, MemoryTransport,
    RemoteChunkSource,
};
pub use range::{ByteRange, ParsedRange, RangePlanner, RangeStatus, ResponsePlan};
pub use response::{RangedResponse, Resource};
