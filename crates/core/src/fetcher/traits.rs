//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;

/// Downloaded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// Content type reported by the server, if any.
    pub content_type: Option<String>,
}

/// Retrieves images from remote URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads the image at `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}
