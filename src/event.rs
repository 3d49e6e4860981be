//! Progress events for analytics.
//!
//! Every response fires one `reloaded` event when it is built, then one event
//! per streamed block. Where the events go is up to the [`ChunkNotifier`]
//! injected at construction.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// A streaming progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkEvent {
    /// First byte covered by the event.
    pub start: u64,
    /// Exclusive nominal end of the block (or of the whole response).
    pub stop: u64,
    /// Caller supplied correlation id.
    pub source_id: String,
    /// Set only on the per-response event fired before any byte is sent.
    pub reloaded: bool,
    /// Set when the block is the last one (see the source docs for which
    /// notion of "last" each source uses).
    pub finished: bool,
    /// Raw `Range` header of the request, only on `reloaded` events.
    pub requested_range: Option<String>,
}

impl ChunkEvent {
    /// Per-block progress event.
    pub fn block(start: u64, stop: u64, source_id: &str, finished: bool) -> Self {
        Self {
            start,
            stop,
            source_id: source_id.to_string(),
            reloaded: false,
            finished,
            requested_range: None,
        }
    }

    /// Per-response event: a client opened (or reopened) the resource here.
    pub fn reloaded(start: u64, stop: u64, source_id: &str, requested_range: Option<&str>) -> Self {
        Self {
            start,
            stop,
            source_id: source_id.to_string(),
            reloaded: true,
            finished: false,
            requested_range: requested_range.map(str::to_string),
        }
    }
}

/// Sink for [`ChunkEvent`]s.
pub trait ChunkNotifier: Send + Sync {
    fn notify(&self, event: &ChunkEvent);
}

impl<F> ChunkNotifier for F
where
    F: Fn(&ChunkEvent) + Send + Sync,
{
    fn notify(&self, event: &ChunkEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChunkNotifier for NoopNotifier {
    fn notify(&self, _event: &ChunkEvent) {}
}

/// Writes events to the `tracing` subscriber at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ChunkNotifier for TracingNotifier {
    fn notify(&self, event: &ChunkEvent) {
        debug!(
            source_id = %event.source_id,
            start = event.start,
            stop = event.stop,
            reloaded = event.reloaded,
            finished = event.finished,
            requested_range = ?event.requested_range,
            "chunk event"
        );
    }
}

/// Forwards events into an unbounded channel.
///
/// A closed receiver is not an error: analytics must never break streaming.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<ChunkEvent>,
}

impl ChannelNotifier {
    pub fn new(sender: UnboundedSender<ChunkEvent>) -> Self {
        Self { sender }
    }
}

impl ChunkNotifier for ChannelNotifier {
    fn notify(&self, event: &ChunkEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("Event receiver dropped, discarding {:?}", event);
        }
    }
}
