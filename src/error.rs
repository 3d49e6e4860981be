//! Error types for ranged streaming.

use thiserror::Error;

/// Errors raised while opening or streaming a ranged response.
///
/// A malformed `Range` header is deliberately absent: it is never an error and
/// always degrades to a full (200) response.
#[derive(Debug, Error)]
pub enum RangedError {
    /// The requested start offset lies beyond the end of the resource.
    #[error("Range not satisfiable for a resource of {size} bytes")]
    RangeNotSatisfiable {
        /// Total size of the resource
        size: u64,
    },

    /// The location is neither a local path nor a supported remote URL.
    #[error("Unsupported source: {location}")]
    UnsupportedSource {
        /// The rejected location
        location: String,
    },

    /// I/O error when reading from a local source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error while fetching a remote chunk.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error response from the blob store.
    #[error("HTTP error: {status}")]
    Http {
        /// HTTP status code
        status: u16,
    },

    /// Remote resource not found (HTTP 404).
    #[error("Resource not found: {url}")]
    NotFound {
        /// URL that was not found
        url: String,
    },

    /// The blob store answered without a usable `Content-Range` header.
    #[error("Invalid Content-Range header: {value}")]
    InvalidContentRange {
        /// Raw header value (empty when missing)
        value: String,
    },

    /// A chunked download was asked for more data after completing.
    #[error("Download session already finished")]
    SessionFinished,
}

impl RangedError {
    /// Whether the error means the source could not deliver bytes.
    ///
    /// These are fatal for the in-flight response: whatever was already
    /// streamed cannot be revoked.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            RangedError::Io(_)
                | RangedError::Network(_)
                | RangedError::Http { .. }
                | RangedError::NotFound { .. }
                | RangedError::InvalidContentRange { .. }
                | RangedError::SessionFinished
        )
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, RangedError>;
