use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ChunkTransport, FetchedChunk};
use crate::error::{RangedError, Result};

/// In-memory blob store transport.
///
/// Serves the same chunk protocol as [`HttpChunkTransport`] without a network,
/// and records every requested range.
///
/// [`HttpChunkTransport`]: super::HttpChunkTransport
pub struct MemoryTransport {
    data: Bytes,
    location: String,
    requests: Mutex<Vec<(u64, u64)>>,
}

impl MemoryTransport {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            location: "memory://blob".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Inclusive ranges requested so far, in order.
    pub fn requests(&self) -> Vec<(u64, u64)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChunkTransport for MemoryTransport {
    async fn fetch(&self, first: u64, last: u64) -> Result<FetchedChunk> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((first, last));
        }

        let size = self.data.len() as u64;
        if first >= size || last < first {
            return Err(RangedError::RangeNotSatisfiable { size });
        }

        let stop = last.saturating_add(1).min(size);
        Ok(FetchedChunk {
            data: self.data.slice(first as usize..stop as usize),
            total_size: size,
        })
    }

    fn location(&self) -> &str {
        &self.location
    }
}
