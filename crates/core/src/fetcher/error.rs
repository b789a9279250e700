//! Error types for the fetcher module.

use thiserror::Error;

/// Errors raised while downloading a remote image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection broke.
    #[error("request failed: {0}")]
    Request(String),

    /// The server did not answer within the fetch timeout.
    #[error("timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The body exceeds the configured size cap.
    #[error("oversized: response exceeds {limit} bytes")]
    Oversized { limit: u64 },

    /// The body is not a raster image.
    #[error("not an image: {0}")]
    NotAnImage(String),
}

impl FetchError {
    /// Short reason code used for metrics labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Timeout { .. } => "timeout",
            Self::Status(_) => "status",
            Self::Oversized { .. } => "oversized",
            Self::NotAnImage(_) => "not_an_image",
        }
    }
}
