use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use super::{ChunkSource, ChunkTransport, ChunkedDownload};
use crate::config::StreamConfig;
use crate::error::{RangedError, Result};
use crate::event::{ChunkEvent, ChunkNotifier};
use crate::range::{ByteRange, ParsedRange, RangePlanner};

/// Chunk size of the probe used to learn the size of a blob before a suffix
/// range can be resolved.
const PROBE_CHUNK_SIZE: u64 = 1024;

/// Chunk source over a remote blob fetched as a chunked download.
///
/// The blob size is unknown until the first chunk arrives, so opening the
/// source already performs the first network round-trip; that chunk is
/// handed out as the first block.
///
/// Event bookkeeping is approximate: the cursor reported in events advances
/// by a full block size after every block, and an event's `stop` is the
/// nominal block end, so offsets may drift from the real byte positions when
/// the store returns short chunks. The byte stream itself is exact. Unlike
/// [`LocalChunkSource`], `finished` is set when the download of the window
/// is complete, not when the end of the whole blob is reached.
///
/// [`LocalChunkSource`]: super::LocalChunkSource
pub struct RemoteChunkSource {
    download: ChunkedDownload,
    initial_chunk: Option<Bytes>,
    size: u64,
    start: u64,
    stop: u64,
    position: u64,
    block_size: u64,
    done: bool,
    source_id: String,
    notifier: Arc<dyn ChunkNotifier>,
}

impl RemoteChunkSource {
    /// Open a download for the requested range.
    ///
    /// `requested` is the header parsed without a size. A suffix range costs
    /// one extra probe fetch. When the request is a ranged one, the configured
    /// `max_content_size` is applied to the end offset before the download
    /// starts. A start past the end of the blob does not fail: the source
    /// opens empty, with `window().start >= size()`.
    pub async fn open(
        transport: Arc<dyn ChunkTransport>,
        requested: Option<ParsedRange>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        info!(
            "Opening remote source {} {:?} ({:?})",
            transport.location(),
            requested,
            config.source_id
        );

        let planner = RangePlanner::new(config.max_content_size);
        let mut known_size = None;
        let (start, stop) = match requested {
            None => (0, None),
            Some(ParsedRange::From { start }) => (start, planner.cap_stop(start, None)),
            Some(ParsedRange::Bounded { start, stop }) => {
                (start, planner.cap_stop(start, Some(stop)))
            }
            Some(suffix @ ParsedRange::Suffix { .. }) => {
                let size = probe_size(transport.clone()).await?;
                known_size = Some(size);
                let resolved = suffix.resolve(size);
                (resolved.start, planner.cap_stop(resolved.start, Some(resolved.stop)))
            }
        };

        let block_size = config.block_size();
        let mut download = ChunkedDownload::new(
            transport,
            start,
            stop.map(|s| s.saturating_sub(1)),
            block_size,
        );

        let unsatisfiable = match known_size {
            Some(size) => start >= size || stop.is_some_and(|s| s <= start),
            None => false,
        };

        let (initial_chunk, size) = if unsatisfiable {
            (None, known_size.unwrap_or_default())
        } else {
            match download.consume_next_chunk().await {
                Ok(chunk) => {
                    let size = download.total_bytes().unwrap_or_default();
                    (Some(chunk), size)
                }
                Err(RangedError::RangeNotSatisfiable { size }) => (None, size),
                Err(e) => return Err(e),
            }
        };

        let stop = stop.map_or(size, |s| s.min(size));
        debug!(
            "Remote source {:?} window {}..{} of {} bytes",
            config.source_id, start, stop, size
        );

        Ok(Self {
            download,
            done: initial_chunk.is_none(),
            initial_chunk,
            size,
            start,
            stop,
            position: start,
            block_size,
            source_id: config.source_id.clone(),
            notifier,
        })
    }
}

/// Learn the blob size with one small fetch; its bytes are discarded.
async fn probe_size(transport: Arc<dyn ChunkTransport>) -> Result<u64> {
    let mut probe = ChunkedDownload::new(transport, 0, None, PROBE_CHUNK_SIZE);
    match probe.consume_next_chunk().await {
        Ok(_) => Ok(probe.total_bytes().unwrap_or_default()),
        Err(RangedError::RangeNotSatisfiable { size }) => Ok(size),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ChunkSource for RemoteChunkSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn window(&self) -> ByteRange {
        ByteRange::new(self.start, self.stop)
    }

    async fn next_block(&mut self) -> Result<Option<Bytes>> {
        if self.done {
            return Ok(None);
        }

        let data = match self.initial_chunk.take() {
            Some(chunk) => chunk,
            None if self.download.is_finished() => {
                self.done = true;
                return Ok(None);
            }
            None => match self.download.consume_next_chunk().await {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.done = true;
                    warn!(
                        "Remote source {:?} failed near {}: {}",
                        self.source_id, self.position, e
                    );
                    return Err(e);
                }
            },
        };

        if data.is_empty() {
            debug!("Remote source {:?} got an empty chunk", self.source_id);
            self.done = true;
            return Ok(None);
        }

        let nominal = self.block_size.min(self.stop.saturating_sub(self.position));
        self.notifier.notify(&ChunkEvent::block(
            self.position,
            self.position.saturating_add(nominal),
            &self.source_id,
            self.download.is_finished(),
        ));
        self.position = self.position.saturating_add(self.block_size);

        Ok(Some(data))
    }
}

impl Drop for RemoteChunkSource {
    fn drop(&mut self) {
        debug!(
            "Closing remote source {:?} after {} bytes",
            self.source_id,
            self.download.bytes_downloaded()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NoopNotifier;
    use crate::io::MemoryTransport;
    use std::sync::Mutex;

    fn blob(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 241) as u8).collect()
    }

    fn config(block_size: u64, max_content_size: u64) -> StreamConfig {
        StreamConfig {
            block_size,
            max_content_size,
            source_id: "remote-test".to_string(),
        }
    }

    async fn collect(source: &mut RemoteChunkSource) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(block) = source.next_block().await.unwrap() {
            out.extend_from_slice(&block);
        }
        out
    }

    #[tokio::test]
    async fn test_open_learns_size_from_first_chunk() {
        let transport = Arc::new(MemoryTransport::new(blob(1000)));
        let mut source = RemoteChunkSource::open(transport.clone(), None, &config(300, 0), Arc::new(NoopNotifier))
            .await
            .unwrap();
        assert_eq!(source.size(), 1000);
        assert_eq!(source.window(), ByteRange::new(0, 1000));
        assert_eq!(transport.requests().len(), 1);

        // First block is the chunk fetched while opening.
        let first = source.next_block().await.unwrap().unwrap();
        assert_eq!(first.len(), 300);
        assert_eq!(transport.requests().len(), 1);

        let rest = collect(&mut source).await;
        assert_eq!([&first[..], &rest[..]].concat(), blob(1000));
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_suffix_range_probes_once() {
        let transport = Arc::new(MemoryTransport::new(blob(5000)));
        let requested = Some(ParsedRange::Suffix { length: 100 });
        let mut source = RemoteChunkSource::open(transport.clone(), requested, &config(64, 0), Arc::new(NoopNotifier))
            .await
            .unwrap();
        assert_eq!(source.window(), ByteRange::new(4900, 5000));
        assert_eq!(transport.requests()[0], (0, PROBE_CHUNK_SIZE - 1));
        assert_eq!(transport.requests()[1], (4900, 4963));
        assert_eq!(collect(&mut source).await, blob(5000)[4900..].to_vec());
    }

    #[tokio::test]
    async fn test_bounded_range() {
        let transport = Arc::new(MemoryTransport::new(blob(1000)));
        let requested = Some(ParsedRange::Bounded { start: 200, stop: 500 });
        let mut source = RemoteChunkSource::open(transport.clone(), requested, &config(128, 0), Arc::new(NoopNotifier))
            .await
            .unwrap();
        assert_eq!(source.window(), ByteRange::new(200, 500));
        assert_eq!(collect(&mut source).await, blob(1000)[200..500].to_vec());
        assert_eq!(transport.requests().last(), Some(&(456, 499)));
    }

    #[tokio::test]
    async fn test_cap_is_applied_before_download() {
        let transport = Arc::new(MemoryTransport::new(blob(1000)));
        let requested = Some(ParsedRange::From { start: 0 });
        let mut source = RemoteChunkSource::open(transport.clone(), requested, &config(1024, 300), Arc::new(NoopNotifier))
            .await
            .unwrap();
        assert_eq!(source.window(), ByteRange::new(0, 300));
        assert_eq!(transport.requests(), vec![(0, 299)]);
        assert_eq!(collect(&mut source).await.len(), 300);
    }

    #[tokio::test]
    async fn test_start_past_end_opens_empty() {
        let transport = Arc::new(MemoryTransport::new(blob(1000)));
        let requested = Some(ParsedRange::From { start: 1500 });
        let mut source = RemoteChunkSource::open(transport, requested, &config(128, 0), Arc::new(NoopNotifier))
            .await
            .unwrap();
        assert_eq!(source.size(), 1000);
        assert_eq!(source.window().start, 1500);
        assert!(source.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_huge_block_size_with_offset_start() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let notifier: Arc<dyn ChunkNotifier> =
            Arc::new(move |event: &ChunkEvent| sink.lock().unwrap().push(event.clone()));

        let transport = Arc::new(MemoryTransport::new(blob(1000)));
        let requested = Some(ParsedRange::From { start: 5 });
        let mut source = RemoteChunkSource::open(transport.clone(), requested, &config(u64::MAX, 0), notifier)
            .await
            .unwrap();
        assert_eq!(collect(&mut source).await, blob(1000)[5..].to_vec());
        assert_eq!(transport.requests(), vec![(5, u64::MAX)]);

        let events = events.lock().unwrap();
        let spans: Vec<_> = events.iter().map(|e| (e.start, e.stop, e.finished)).collect();
        assert_eq!(spans, vec![(5, 1000, true)]);
    }

    #[tokio::test]
    async fn test_events_use_nominal_cursor() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let notifier: Arc<dyn ChunkNotifier> =
            Arc::new(move |event: &ChunkEvent| sink.lock().unwrap().push(event.clone()));

        let transport = Arc::new(MemoryTransport::new(blob(250)));
        let mut source = RemoteChunkSource::open(transport, None, &config(100, 0), notifier)
            .await
            .unwrap();
        collect(&mut source).await;

        let events = events.lock().unwrap();
        let spans: Vec<_> = events.iter().map(|e| (e.start, e.stop, e.finished)).collect();
        assert_eq!(spans, vec![(0, 100, false), (100, 200, false), (200, 250, true)]);
        assert!(events.iter().all(|e| !e.reloaded && e.requested_range.is_none()));
    }
}
