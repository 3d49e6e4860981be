/// Default block size: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: u64 = 1024 * 1024;

/// Streaming settings shared by local and remote sources.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Upper bound of a single streamed block, in bytes.
    pub block_size: u64,
    /// Maximum bytes a partial response may carry (0 = unlimited).
    pub max_content_size: u64,
    /// Opaque id copied into every event for analytics correlation.
    pub source_id: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_content_size: 0,
            source_id: String::new(),
        }
    }
}

impl StreamConfig {
    pub fn with_source_id(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Default::default()
        }
    }

    /// Block size, never zero.
    pub(crate) fn block_size(&self) -> u64 {
        self.block_size.max(1)
    }
}

/// Settings for the HTTP chunk transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Custom User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}
