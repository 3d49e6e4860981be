//! Per-request orchestration of range negotiation and streaming.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::HeaderName;
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::info;

use crate::config::{HttpConfig, StreamConfig};
use crate::error::{RangedError, Result};
use crate::event::{ChunkEvent, ChunkNotifier};
use crate::io::{
    ChunkSource, ChunkTransport, HttpChunkTransport, LocalChunkSource, RemoteChunkSource,
    into_stream,
};
use crate::range::{RangePlanner, RangeStatus, ResponsePlan, parse_range_header};

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Local(PathBuf),
    Remote(String),
}

impl Resource {
    /// Classify a location.
    ///
    /// `http://` and `https://` URLs are remote, `file://` URLs and bare paths
    /// are local. Any other `scheme://` is rejected.
    pub fn parse(location: &str) -> Result<Self> {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Resource::Remote(location.to_string()));
        }
        if lower.starts_with("file://") {
            return Ok(Resource::Local(PathBuf::from(&location["file://".len()..])));
        }
        if location.contains("://") {
            return Err(RangedError::UnsupportedSource {
                location: location.to_string(),
            });
        }
        Ok(Resource::Local(PathBuf::from(location)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Resource::Remote(_))
    }
}

/// A planned response and the source that will stream its body.
///
/// Building one fires the `reloaded` event. Nothing is streamed until the
/// caller pulls blocks, and a 416 response has no body at all.
pub struct RangedResponse {
    plan: ResponsePlan,
    body: Option<Box<dyn ChunkSource>>,
}

impl RangedResponse {
    /// Response over a seekable local stream.
    pub async fn local<R>(
        stream: R,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        let mut source = LocalChunkSource::open(stream, config, notifier.clone()).await?;
        let plan = RangePlanner::new(config.max_content_size).plan(header, source.size());
        if plan.status.has_body() {
            source.open_at(plan.range.start, plan.range.stop).await?;
        }
        Ok(Self::finish(plan, Box::new(source), header, config, &*notifier))
    }

    /// Response over a file on disk.
    pub async fn from_path(
        path: &Path,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Self::local(file, header, config, notifier).await
    }

    /// Response over a remote blob.
    ///
    /// The header is parsed before the size is known; the planner runs once
    /// the first chunk has revealed it.
    pub async fn remote(
        transport: Arc<dyn ChunkTransport>,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        let requested = header.and_then(|h| parse_range_header(h, None));
        let source = RemoteChunkSource::open(transport, requested, config, notifier.clone()).await?;
        let window = requested.map(|_| source.window());
        let plan = RangePlanner::new(config.max_content_size).decide(window, source.size());
        Ok(Self::finish(plan, Box::new(source), header, config, &*notifier))
    }

    /// Response over a blob served at an HTTP(S) URL.
    pub async fn from_url(
        url: &str,
        http: &HttpConfig,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        let transport = Arc::new(HttpChunkTransport::new(url, http)?);
        Self::remote(transport, header, config, notifier).await
    }

    /// Response for any supported [`Resource`].
    pub async fn open(
        resource: &Resource,
        http: &HttpConfig,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: Arc<dyn ChunkNotifier>,
    ) -> Result<Self> {
        match resource {
            Resource::Local(path) => Self::from_path(path, header, config, notifier).await,
            Resource::Remote(url) => Self::from_url(url, http, header, config, notifier).await,
        }
    }

    fn finish(
        plan: ResponsePlan,
        source: Box<dyn ChunkSource>,
        header: Option<&str>,
        config: &StreamConfig,
        notifier: &dyn ChunkNotifier,
    ) -> Self {
        info!(
            "Response {} for {:?}: {}..{} of {} (Range: {:?})",
            plan.status.code(),
            config.source_id,
            plan.range.start,
            plan.range.stop,
            plan.size,
            header
        );
        notifier.notify(&ChunkEvent::reloaded(
            plan.range.start,
            plan.range.stop,
            &config.source_id,
            header,
        ));

        let body = plan.status.has_body().then_some(source);
        Self { plan, body }
    }

    pub fn plan(&self) -> &ResponsePlan {
        &self.plan
    }

    pub fn status(&self) -> RangeStatus {
        self.plan.status
    }

    pub fn headers(&self) -> &[(HeaderName, String)] {
        &self.plan.headers
    }

    /// Next body block; always `None` for a 416 response.
    pub async fn next_block(&mut self) -> Result<Option<Bytes>> {
        match self.body.as_mut() {
            Some(source) => source.next_block().await,
            None => Ok(None),
        }
    }

    /// The body as a stream of blocks.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        match self.body {
            Some(source) => into_stream(source).boxed(),
            None => stream::empty::<Result<Bytes>>().boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parse() {
        assert_eq!(
            Resource::parse("https://cdn.example.com/a.mp3").unwrap(),
            Resource::Remote("https://cdn.example.com/a.mp3".to_string())
        );
        assert!(Resource::parse("HTTP://example.com/a").unwrap().is_remote());
        assert_eq!(
            Resource::parse("file:///srv/media/a.mp3").unwrap(),
            Resource::Local(PathBuf::from("/srv/media/a.mp3"))
        );
        assert_eq!(
            Resource::parse("media/a.mp3").unwrap(),
            Resource::Local(PathBuf::from("media/a.mp3"))
        );
        assert!(matches!(
            Resource::parse("ftp://example.com/a.mp3"),
            Err(RangedError::UnsupportedSource { .. })
        ));
    }
}
