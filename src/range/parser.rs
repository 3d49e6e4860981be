//! `Range` and `Content-Range` header parsing.
//!
//! Only the `bytes` unit is understood. A header naming several sub-ranges is
//! accepted, but only the first one is ever served: multipart/byteranges
//! responses are not produced.

use super::structures::{ByteRange, ParsedRange};

/// Parse a `Range` request header.
///
/// Every comma-separated spec must be well formed, whether or not `size` is
/// known. With `size` known, the first spec is returned already resolved as
/// [`ParsedRange::Bounded`]. With `size` unknown, open-ended or suffix forms
/// are returned unresolved.
///
/// Returns `None` for anything that is not a usable byte range; callers treat
/// that as a plain, unconditional request.
///
/// # Examples
///
/// ```
/// use rangeserve::range::{parse_range_header, ParsedRange};
///
/// assert_eq!(
///     parse_range_header("bytes=200-499", Some(1000)),
///     Some(ParsedRange::Bounded { start: 200, stop: 500 })
/// );
/// assert_eq!(
///     parse_range_header("bytes=-100", None),
///     Some(ParsedRange::Suffix { length: 100 })
/// );
/// assert_eq!(parse_range_header("items=0-1", Some(1000)), None);
/// ```
pub fn parse_range_header(header: &str, size: Option<u64>) -> Option<ParsedRange> {
    let (unit, set) = header.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }

    let mut specs = set.split(',');
    let first = parse_spec(specs.next()?)?;
    // Extra specs must still be valid, but are dropped.
    for spec in specs {
        parse_spec(spec)?;
    }

    match size {
        Some(size) => {
            let resolved = first.resolve(size);
            Some(ParsedRange::Bounded {
                start: resolved.start,
                stop: resolved.stop,
            })
        }
        None => Some(first),
    }
}

/// Parse one `first-last`, `first-` or `-suffix` spec.
fn parse_spec(spec: &str) -> Option<ParsedRange> {
    let (first, last) = spec.trim().split_once('-')?;

    match (first.is_empty(), last.is_empty()) {
        (true, true) => None,
        (true, false) => Some(ParsedRange::Suffix {
            length: parse_number(last)?,
        }),
        (false, true) => Some(ParsedRange::From {
            start: parse_number(first)?,
        }),
        (false, false) => {
            let start = parse_number(first)?;
            // Inclusive end on the wire, exclusive stop internally. An end
            // of u64::MAX is past any resource and is clamped later.
            let stop = parse_number(last)?.saturating_add(1);
            if start >= stop {
                return None;
            }
            Some(ParsedRange::Bounded { start, stop })
        }
    }
}

/// Digits only: `u64::from_str` would also accept a leading `+`.
fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `Content-Range` value for a satisfied range.
pub fn content_range(range: ByteRange, size: u64) -> String {
    format!(
        "bytes {}-{}/{}",
        range.start,
        range.stop.saturating_sub(1),
        size
    )
}

/// `Content-Range` value accompanying a 416 response.
pub fn unsatisfied_content_range(size: u64) -> String {
    format!("bytes */{}", size)
}

/// A parsed `Content-Range` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// Satisfied window, `None` for `bytes */N`.
    pub range: Option<ByteRange>,
    /// Total size, `None` when the server sent `*`.
    pub size: Option<u64>,
}

/// Parse `bytes S-E/N`, `bytes S-E/*` or `bytes */N`.
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes")?;
    if !rest.starts_with(' ') {
        return None;
    }
    let (range, size) = rest.trim_start().split_once('/')?;

    let size = match size.trim() {
        "*" => None,
        s => Some(parse_number(s)?),
    };

    let range = match range.trim() {
        "*" => None,
        r => {
            let (first, last) = r.split_once('-')?;
            let first = parse_number(first)?;
            let last = parse_number(last)?;
            if last < first {
                return None;
            }
            Some(ByteRange::new(first, last.checked_add(1)?))
        }
    };

    if range.is_none() && size.is_none() {
        return None;
    }
    Some(ContentRange { range, size })
}
