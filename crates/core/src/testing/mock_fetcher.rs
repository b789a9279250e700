//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchedImage, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// Serves canned responses by URL. Unknown URLs answer 404. An optional
/// size cap mirrors the production fetcher's limit.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, Result<FetchedImage, FetchError>>>>,
    requested: Arc<RwLock<Vec<String>>>,
    max_bytes: Option<u64>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject bodies larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Serve `bytes` as an image at `url`.
    pub async fn add_image(&self, url: &str, bytes: Vec<u8>) {
        self.add_response(
            url,
            Ok(FetchedImage {
                bytes,
                content_type: Some("image/png".to_string()),
            }),
        )
        .await;
    }

    /// Serve an arbitrary response at `url`.
    pub async fn add_response(&self, url: &str, response: Result<FetchedImage, FetchError>) {
        self.responses.write().await.insert(url.to_string(), response);
    }

    /// URLs requested so far, in order.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.requested.write().await.push(url.to_string());

        let response = self
            .responses
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))?;

        if let Some(limit) = self.max_bytes {
            if response.bytes.len() as u64 > limit {
                return Err(FetchError::Oversized { limit });
            }
        }
        Ok(response)
    }
}
