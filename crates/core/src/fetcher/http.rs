//! HTTP fetcher built on `reqwest`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::FetchError;
use super::traits::{FetchedImage, Fetcher};
use crate::config::FetchConfig;
use crate::metrics;

const MAX_REDIRECTS: usize = 5;

/// Downloads images over HTTP(S) with a timeout and a body size cap.
///
/// The cap is checked against `Content-Length` before any body is read and
/// again while streaming, so a server that lies about the length cannot push
/// more than `max_bytes` into memory.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn map_reqwest(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            FetchError::Request(err.to_string())
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase());
        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with("image/") {
                return Err(FetchError::NotAnImage(format!("content type {}", ct)));
            }
        }

        let limit = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::Oversized { limit });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_reqwest(e))? {
            if (bytes.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::Oversized { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        // Only raster formats can be traced, whatever the header says.
        if image::guess_format(&bytes).is_err() {
            return Err(FetchError::NotAnImage(
                "body is not a recognized raster image".to_string(),
            ));
        }

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        match self.fetch_inner(url).await {
            Ok(image) => {
                debug!(url, size = image.bytes.len(), "Fetched remote image");
                Ok(image)
            }
            Err(e) => {
                metrics::FETCH_FAILURES.with_label_values(&[e.reason()]).inc();
                warn!(url, error = %e, "Remote fetch failed");
                Err(e)
            }
        }
    }
}
