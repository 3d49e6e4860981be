use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderName};

/// Half-open byte interval `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub stop: u64,
}

impl ByteRange {
    pub fn new(start: u64, stop: u64) -> Self {
        Self { start, stop }
    }

    /// Number of bytes covered, zero for an empty or inverted range.
    pub fn len(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive last byte, as written in `Range`/`Content-Range` headers.
    pub fn last(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.stop - 1)
        }
    }
}

/// First requested sub-range of a `Range` header.
///
/// When the resource size is not known yet, open-ended and suffix forms stay
/// unresolved until [`ParsedRange::resolve`] is called with the real size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRange {
    /// `N-M`, stored with an exclusive stop (`M + 1`).
    Bounded { start: u64, stop: u64 },
    /// `N-`: from `start` to the end of the resource.
    From { start: u64 },
    /// `-K`: the last `length` bytes.
    Suffix { length: u64 },
}

impl ParsedRange {
    /// Resolve against the total resource size.
    ///
    /// `Bounded` ranges are returned as written; clamping `stop` to the size
    /// is the planner's job.
    pub fn resolve(&self, size: u64) -> ByteRange {
        match *self {
            ParsedRange::Bounded { start, stop } => ByteRange::new(start, stop),
            ParsedRange::From { start } => ByteRange::new(start, size),
            ParsedRange::Suffix { length } => ByteRange::new(size.saturating_sub(length), size),
        }
    }

    /// Start offset if it does not depend on the resource size.
    pub fn known_start(&self) -> Option<u64> {
        match *self {
            ParsedRange::Bounded { start, .. } | ParsedRange::From { start } => Some(start),
            ParsedRange::Suffix { .. } => None,
        }
    }
}

/// Outcome of range negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    /// 200: whole resource, no `Content-Range`.
    Full,
    /// 206: a single window of the resource.
    Partial,
    /// 416: the start offset is past the end; no body.
    NotSatisfiable,
}

impl RangeStatus {
    pub fn code(&self) -> u16 {
        match self {
            RangeStatus::Full => 200,
            RangeStatus::Partial => 206,
            RangeStatus::NotSatisfiable => 416,
        }
    }

    pub fn has_body(&self) -> bool {
        !matches!(self, RangeStatus::NotSatisfiable)
    }
}

/// Status, window and headers decided for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePlan {
    pub status: RangeStatus,
    /// Effective window to stream. For 416 this is the requested start and
    /// the resource size, and nothing is streamed.
    pub range: ByteRange,
    /// Total resource size.
    pub size: u64,
    pub headers: Vec<(HeaderName, String)>,
}

impl ResponsePlan {
    pub(crate) fn full(size: u64) -> Self {
        Self {
            status: RangeStatus::Full,
            range: ByteRange::new(0, size),
            size,
            headers: vec![
                (ACCEPT_RANGES, "bytes".to_string()),
                (CONTENT_LENGTH, size.to_string()),
            ],
        }
    }

    pub(crate) fn partial(range: ByteRange, size: u64) -> Self {
        Self {
            status: RangeStatus::Partial,
            range,
            size,
            headers: vec![
                (ACCEPT_RANGES, "bytes".to_string()),
                (CONTENT_RANGE, super::content_range(range, size)),
                (CONTENT_LENGTH, range.len().to_string()),
            ],
        }
    }

    pub(crate) fn not_satisfiable(start: u64, size: u64) -> Self {
        Self {
            status: RangeStatus::NotSatisfiable,
            range: ByteRange::new(start, size),
            size,
            headers: vec![
                (ACCEPT_RANGES, "bytes".to_string()),
                (CONTENT_RANGE, super::unsatisfied_content_range(size)),
            ],
        }
    }

    /// Look up a planned header value by name.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
