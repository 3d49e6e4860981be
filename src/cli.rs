use clap::Parser;

use crate::config::{DEFAULT_BLOCK_SIZE, HttpConfig, StreamConfig};

#[derive(Parser, Debug)]
#[command(name = "rangeserve")]
#[command(version)]
#[command(about = "Serve a byte range of a local file or remote blob", long_about = None)]
#[command(after_help = "Examples:\n  \
  rangeserve movie.mp4 -r bytes=0-1023 -o head.bin   first KiB as a 206 response\n  \
  rangeserve https://example.com/a.mp3 -r bytes=-100  last 100 bytes of a remote blob\n  \
  rangeserve song.flac -r bytes=0- -m 1048576 -e      capped response, events as JSON")]
pub struct Cli {
    /// File path or HTTP URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Range header value, e.g. "bytes=0-499"
    #[arg(short = 'r', long = "range", value_name = "RANGE")]
    pub range: Option<String>,

    /// Block size in bytes
    #[arg(short = 'b', long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u64,

    /// Maximum bytes per partial response (0 = unlimited)
    #[arg(short = 'm', long = "max-content-size", default_value_t = 0)]
    pub max_content_size: u64,

    /// Identifier copied into every event
    #[arg(short = 'i', long = "id", value_name = "ID")]
    pub id: Option<String>,

    /// Write the body to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout: u64,

    /// Print every chunk event as a JSON line on stderr
    #[arg(short = 'e', long = "events")]
    pub events: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode: no status or headers on stderr
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            block_size: self.block_size,
            max_content_size: self.max_content_size,
            source_id: self.id.clone().unwrap_or_else(|| self.source.clone()),
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout_secs: self.timeout,
            ..Default::default()
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
