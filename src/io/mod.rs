mod download;
mod http;
mod local;
mod memory;
mod remote;

pub use download::ChunkedDownload;
pub use http::HttpChunkTransport;
pub use local::LocalChunkSource;
pub use memory::MemoryTransport;
pub use remote::RemoteChunkSource;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};

use crate::error::Result;
use crate::range::ByteRange;

/// Lazy, single-pass sequence of blocks over a window of a resource
#[async_trait]
pub trait ChunkSource: Send {
    /// Total size of the underlying resource
    fn size(&self) -> u64;

    /// The `[start, stop)` window this source streams
    fn window(&self) -> ByteRange;

    /// Produce the next block, or `None` once the window is exhausted.
    ///
    /// An error is returned at most once; afterwards the source only yields
    /// `None`.
    async fn next_block(&mut self) -> Result<Option<Bytes>>;
}

#[async_trait]
impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn window(&self) -> ByteRange {
        (**self).window()
    }

    async fn next_block(&mut self) -> Result<Option<Bytes>> {
        (**self).next_block().await
    }
}

/// Adapt a source into a `Stream` for response layers that consume one.
pub fn into_stream<S>(source: S) -> impl Stream<Item = Result<Bytes>> + Send
where
    S: ChunkSource + 'static,
{
    stream::unfold(source, |mut source| async move {
        match source.next_block().await {
            Ok(Some(block)) => Some((Ok(block), source)),
            Ok(None) => None,
            Err(e) => Some((Err(e), source)),
        }
    })
}

/// One network chunk and the total size reported alongside it
#[derive(Debug, Clone)]
pub struct FetchedChunk {
    pub data: Bytes,
    pub total_size: u64,
}

/// Trait for fetching inclusive byte ranges from a remote blob
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Fetch bytes `first..=last`.
    ///
    /// Fewer bytes may come back near the end of the blob. A `first` past
    /// the end must fail with `RangedError::RangeNotSatisfiable` carrying the
    /// blob size.
    async fn fetch(&self, first: u64, last: u64) -> Result<FetchedChunk>;

    /// Identifier used in logs, typically the URL
    fn location(&self) -> &str;
}
