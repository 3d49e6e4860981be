//! Byte-range negotiation.
//!
//! - [`parser`]: `Range` request header and `Content-Range` response header parsing
//! - [`planner`]: the 200 / 206 / 416 decision and the headers that go with it
//! - [`structures`]: the value types shared by both
//!
//! The parser works in two phases when the resource size is not yet known
//! (remote blobs): it returns an unresolved [`ParsedRange`] that is resolved
//! once the first network response reveals the size.

mod parser;
mod planner;
mod structures;

pub use parser::{
    ContentRange, content_range, parse_content_range, parse_range_header,
    unsatisfied_content_range,
};
pub use planner::RangePlanner;
pub use structures::*;
