use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{ChunkTransport, FetchedChunk};
use crate::config::HttpConfig;
use crate::error::{RangedError, Result};
use crate::range::parse_content_range;

/// HTTP transport fetching blob chunks with Range requests
///
/// Each fetch is a single GET; failures are not retried, a failed chunk ends
/// the stream it belongs to.
pub struct HttpChunkTransport {
    client: Client,
    url: String,
    transferred_bytes: AtomicU64,
}

impl HttpChunkTransport {
    /// Create a new transport for `url`
    ///
    /// No request is sent until the first fetch.
    pub fn new(url: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| concat!("rangeserve/", env!("CARGO_PKG_VERSION")).to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

/// Read the `Content-Range` header of a 206 or 416 answer.
fn content_range_size(headers: &HeaderMap) -> Result<u64> {
    let value = headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    parse_content_range(value)
        .and_then(|range| range.size)
        .ok_or_else(|| RangedError::InvalidContentRange {
            value: value.to_string(),
        })
}

#[async_trait]
impl ChunkTransport for HttpChunkTransport {
    async fn fetch(&self, first: u64, last: u64) -> Result<FetchedChunk> {
        let range = format!("bytes={}-{}", first, last);
        let resp = self.client.get(&self.url).header(RANGE, range).send().await?;
        let expected = last.saturating_sub(first).saturating_add(1);

        let chunk = match resp.status() {
            StatusCode::PARTIAL_CONTENT => {
                let total_size = content_range_size(resp.headers())?;
                let mut data = resp.bytes().await?;
                data.truncate(expected as usize);
                FetchedChunk { data, total_size }
            }
            // Server ignored the Range header and sent everything.
            StatusCode::OK => {
                let body = resp.bytes().await?;
                let total_size = body.len() as u64;
                if first >= total_size {
                    return Err(RangedError::RangeNotSatisfiable { size: total_size });
                }
                let stop = last.saturating_add(1).min(total_size);
                FetchedChunk {
                    data: body.slice(first as usize..stop as usize),
                    total_size,
                }
            }
            StatusCode::RANGE_NOT_SATISFIABLE => {
                let size = content_range_size(resp.headers())?;
                return Err(RangedError::RangeNotSatisfiable { size });
            }
            StatusCode::NOT_FOUND => {
                return Err(RangedError::NotFound {
                    url: self.url.clone(),
                });
            }
            status => {
                return Err(RangedError::Http {
                    status: status.as_u16(),
                });
            }
        };

        self.transferred_bytes
            .fetch_add(chunk.data.len() as u64, Ordering::Relaxed);

        Ok(chunk)
    }

    fn location(&self) -> &str {
        &self.url
    }
}
