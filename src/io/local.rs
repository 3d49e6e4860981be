use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::{debug, info, warn};

use super::ChunkSource;
use crate::config::StreamConfig;
use crate::error::Result;
use crate::event::{ChunkEvent, ChunkNotifier};
use crate::range::ByteRange;

/// Chunk source over a seekable local stream.
///
/// The resource size is read once, when the source is opened, by seeking to
/// the end of the stream. This works the same for files and in-memory
/// cursors.
///
/// The `finished` flag of each event answers "is this the last block of the
/// whole resource", i.e. the block's nominal end reaches the resource size.
/// It can therefore stay `false` for the last block of a window that ends
/// early.
pub struct LocalChunkSource<R> {
    stream: R,
    size: u64,
    start: u64,
    stop: u64,
    position: u64,
    block_size: u64,
    done: bool,
    source_id: String,
    notifier: Arc<dyn ChunkNotifier>,
}

impl LocalChunkSource<tokio::fs::File> {
    /// Open a file from the local filesystem.
    pub async fn open_path(
        path: &Path,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Self::open(file, config, notifier).await
    }
}

impl<R> LocalChunkSource<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    /// Wrap a stream, covering the whole resource until [`open_at`] narrows it.
    ///
    /// [`open_at`]: Self::open_at
    pub async fn open(
        mut stream: R,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        let size = stream.seek(SeekFrom::End(0)).await?;
        stream.seek(SeekFrom::Start(0)).await?;

        info!("Opened local source {:?} ({} bytes)", config.source_id, size);

        Ok(Self {
            stream,
            size,
            start: 0,
            stop: size,
            position: 0,
            block_size: config.block_size(),
            done: false,
            source_id: config.source_id.clone(),
            notifier,
        })
    }

    /// Set the window to `[start, stop)` and seek to `start`.
    ///
    /// `stop` is clamped to the resource size.
    pub async fn open_at(&mut self, start: u64, stop: u64) -> Result<()> {
        let stop = stop.min(self.size);
        self.stream.seek(SeekFrom::Start(start)).await?;
        self.start = start;
        self.stop = stop;
        self.position = start;
        self.done = start >= stop;
        debug!(
            "Local source {:?} window {}..{} block {}",
            self.source_id, start, stop, self.block_size
        );
        Ok(())
    }
}

#[async_trait]
impl<R> ChunkSource for LocalChunkSource<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    fn size(&self) -> u64 {
        self.size
    }

    fn window(&self) -> ByteRange {
        ByteRange::new(self.start, self.stop)
    }

    async fn next_block(&mut self) -> Result<Option<Bytes>> {
        if self.done || self.position >= self.stop {
            self.done = true;
            return Ok(None);
        }

        let requested = self.block_size.min(self.stop - self.position);
        let mut buf = Vec::with_capacity(requested as usize);
        if let Err(e) = (&mut self.stream).take(requested).read_to_end(&mut buf).await {
            self.done = true;
            warn!(
                "Local source {:?} failed at {}: {}",
                self.source_id, self.position, e
            );
            return Err(e.into());
        }

        if buf.is_empty() {
            debug!("Local source {:?} hit EOF at {}", self.source_id, self.position);
            self.done = true;
            return Ok(None);
        }

        let finished = self.position.saturating_add(self.block_size) >= self.size;
        self.notifier.notify(&ChunkEvent::block(
            self.position,
            self.position + requested,
            &self.source_id,
            finished,
        ));

        // Short read: the resource ended before the window did.
        if (buf.len() as u64) < requested {
            self.done = true;
        }
        self.position += buf.len() as u64;

        Ok(Some(Bytes::from(buf)))
    }
}
