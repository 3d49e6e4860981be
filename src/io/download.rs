use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::ChunkTransport;
use crate::error::{RangedError, Result};

/// A download of `start..=end` performed as a series of bounded fetches.
///
/// The total size of the blob is only known once the first chunk came back.
pub struct ChunkedDownload {
    transport: Arc<dyn ChunkTransport>,
    start: u64,
    /// Inclusive last byte, `None` for "until the end of the blob".
    end: Option<u64>,
    chunk_size: u64,
    bytes_downloaded: u64,
    total_bytes: Option<u64>,
    finished: bool,
}

impl ChunkedDownload {
    pub fn new(
        transport: Arc<dyn ChunkTransport>,
        start: u64,
        end: Option<u64>,
        chunk_size: u64,
    ) -> Self {
        Self {
            transport,
            start,
            end,
            chunk_size: chunk_size.max(1),
            bytes_downloaded: 0,
            total_bytes: None,
            finished: false,
        }
    }

    /// Fetch the next chunk.
    ///
    /// An empty chunk, an error or reaching the end of the window or blob all
    /// finish the session; asking a finished session for more is an error.
    pub async fn consume_next_chunk(&mut self) -> Result<Bytes> {
        if self.finished {
            return Err(RangedError::SessionFinished);
        }

        let first = self.start + self.bytes_downloaded;
        let mut last = first.saturating_add(self.chunk_size - 1);
        if let Some(end) = self.end {
            last = last.min(end);
        }
        if let Some(total) = self.total_bytes {
            last = last.min(total.saturating_sub(1));
        }

        let chunk = match self.transport.fetch(first, last).await {
            Ok(chunk) => chunk,
            Err(e) => {
                self.finished = true;
                if let RangedError::RangeNotSatisfiable { size } = e {
                    self.total_bytes = Some(size);
                }
                return Err(e);
            }
        };

        self.total_bytes = Some(chunk.total_size);
        self.bytes_downloaded += chunk.data.len() as u64;

        let window_stop = match self.end {
            Some(end) => end.saturating_add(1).min(chunk.total_size),
            None => chunk.total_size,
        };
        if chunk.data.is_empty() || self.start + self.bytes_downloaded >= window_stop {
            self.finished = true;
        }

        debug!(
            "Fetched {}..={} of {} ({} bytes, finished: {})",
            first,
            last,
            self.transport.location(),
            chunk.data.len(),
            self.finished
        );

        Ok(chunk.data)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total blob size, known after the first fetch.
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryTransport;

    fn transport(len: usize) -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport::new((0..len).map(|i| i as u8).collect::<Vec<_>>()))
    }

    #[tokio::test]
    async fn test_unbounded_download() {
        let transport = transport(250);
        let mut download = ChunkedDownload::new(transport.clone(), 0, None, 100);
        assert_eq!(download.total_bytes(), None);

        let mut lens = Vec::new();
        while !download.is_finished() {
            lens.push(download.consume_next_chunk().await.unwrap().len());
        }
        assert_eq!(lens, vec![100, 100, 50]);
        assert_eq!(download.total_bytes(), Some(250));
        assert_eq!(download.bytes_downloaded(), 250);
        assert_eq!(transport.requests(), vec![(0, 99), (100, 199), (200, 249)]);
    }

    #[tokio::test]
    async fn test_bounded_download() {
        let transport = transport(250);
        let mut download = ChunkedDownload::new(transport.clone(), 10, Some(139), 100);
        let a = download.consume_next_chunk().await.unwrap();
        let b = download.consume_next_chunk().await.unwrap();
        assert!(download.is_finished());
        assert_eq!(a.len() + b.len(), 130);
        assert_eq!(b[b.len() - 1], 139);
        assert_eq!(transport.requests(), vec![(10, 109), (110, 139)]);
    }

    #[tokio::test]
    async fn test_finished_session_errors() {
        let mut download = ChunkedDownload::new(transport(10), 0, None, 100);
        download.consume_next_chunk().await.unwrap();
        assert!(download.is_finished());
        assert!(matches!(
            download.consume_next_chunk().await,
            Err(RangedError::SessionFinished)
        ));
    }

    #[tokio::test]
    async fn test_start_past_end_reports_size() {
        let mut download = ChunkedDownload::new(transport(10), 20, None, 100);
        assert!(matches!(
            download.consume_next_chunk().await,
            Err(RangedError::RangeNotSatisfiable { size: 10 })
        ));
        assert!(download.is_finished());
        assert_eq!(download.total_bytes(), Some(10));
    }
}
