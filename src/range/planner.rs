use tracing::debug;

use super::parser::parse_range_header;
use super::structures::{ByteRange, ResponsePlan};

/// Decides status, window and headers for a response.
///
/// `max_content_size` caps how many bytes a single partial response may
/// carry (0 = unlimited). A capped client has to come back with an advanced
/// start offset, which is what turns one long transfer into several
/// observable sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangePlanner {
    max_content_size: u64,
}

impl RangePlanner {
    pub fn new(max_content_size: u64) -> Self {
        Self { max_content_size }
    }

    pub fn max_content_size(&self) -> u64 {
        self.max_content_size
    }

    /// Plan a response from the raw `Range` header against a known size.
    pub fn plan(&self, header: Option<&str>, size: u64) -> ResponsePlan {
        let requested = header
            .and_then(|h| parse_range_header(h, Some(size)))
            .map(|parsed| parsed.resolve(size));
        if header.is_some() && requested.is_none() {
            debug!("Ignoring malformed Range header {:?}", header);
        }
        self.decide(requested, size)
    }

    /// Plan a response from an already resolved request window.
    pub fn decide(&self, requested: Option<ByteRange>, size: u64) -> ResponsePlan {
        let Some(requested) = requested else {
            return ResponsePlan::full(size);
        };

        if requested.start >= size {
            return ResponsePlan::not_satisfiable(requested.start, size);
        }

        let mut stop = requested.stop.min(size);
        if let Some(limit) = self.limit_from(requested.start) {
            stop = stop.min(limit);
        }
        ResponsePlan::partial(ByteRange::new(requested.start, stop), size)
    }

    /// Exclusive stop imposed by the cap on a response starting at `start`.
    pub fn limit_from(&self, start: u64) -> Option<u64> {
        (self.max_content_size > 0).then(|| start.saturating_add(self.max_content_size))
    }

    /// Apply the cap to a window whose size is not known yet.
    ///
    /// Remote downloads need their end offset up front, so the cap is folded
    /// into the requested stop (`None` = to the end of the resource).
    pub fn cap_stop(&self, start: u64, stop: Option<u64>) -> Option<u64> {
        match (stop, self.limit_from(start)) {
            (Some(stop), Some(limit)) => Some(stop.min(limit)),
            (stop, limit) => stop.or(limit),
        }
    }
}
