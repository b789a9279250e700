//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a real filesystem artifact store and mock engines, so the HTTP
//! surface can be exercised without `vtracer`, `rsvg-convert` or network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tracery_core::{
    testing::{MockFetcher, MockOptimizer, MockRenderer, MockTracer},
    ArtifactStore, Config, ConversionService, FsArtifactStore, JobContext, ServiceOptions,
};
use tracery_server::state::AppState;

/// Re-export fixtures for test convenience
pub use tracery_core::testing::fixtures;

/// Test fixture for API testing with mock engines.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::new().await;
///     let form = MultipartForm::new().file("files", "a.png", &fixtures::solid_png(4, 4, [0, 0, 0]));
///     let response = fixture.post_form("/api/convert", form).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub tracer: Arc<MockTracer>,
    pub optimizer: Arc<MockOptimizer>,
    pub renderer: Arc<MockRenderer>,
    pub fetcher: Arc<MockFetcher>,
    pub store: Arc<dyn ArtifactStore>,
    /// Holds the artifact directory
    pub temp_dir: TempDir,
}

/// JSON response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response for non-JSON endpoints
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_upload_bytes: usize,
    pub max_items: usize,
    pub delete_after_download: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_items: 10,
            delete_after_download: false,
        }
    }
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: "tracery-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn file(mut self, field: &str, filename: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, field, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, field, value
            )
            .as_bytes(),
        );
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.server.max_upload_bytes = test_config.max_upload_bytes;
        config.storage.dir = temp_dir.path().join("artifacts");
        config.storage.delete_after_download = test_config.delete_after_download;
        config.batch.max_items = test_config.max_items;

        let store: Arc<dyn ArtifactStore> = Arc::new(
            FsArtifactStore::open(&config.storage.dir, config.storage.retention())
                .await
                .expect("Failed to open artifact store"),
        );

        let tracer = Arc::new(MockTracer::new());
        let optimizer = Arc::new(MockOptimizer::new());
        let renderer = Arc::new(MockRenderer::new());
        let fetcher = Arc::new(MockFetcher::new());

        let ctx = JobContext {
            tracer: tracer.clone(),
            optimizer: optimizer.clone(),
            renderer: renderer.clone(),
            fetcher: fetcher.clone(),
            store: Arc::clone(&store),
            retain_uploads: false,
        };
        let service = ConversionService::new(ctx, 2, ServiceOptions::from_config(&config));

        let state = Arc::new(AppState::new(config, Arc::new(service)));
        let router = tracery_server::api::create_router(state);

        Self {
            router,
            tracer,
            optimizer,
            renderer,
            fetcher,
            store,
            temp_dir,
        }
    }

    /// Send a GET request expecting JSON.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.get_raw(path).await.into()
    }

    /// Send a GET request and keep the raw body.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &serde_json::to_string(&body).unwrap())
            .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.into()
    }

    /// Send a multipart form expecting JSON.
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> TestResponse {
        self.post_form_raw(path, form).await.into()
    }

    /// Send a multipart form and keep the raw body.
    pub async fn post_form_raw(&self, path: &str, form: MultipartForm) -> RawResponse {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Upload one image and return the handle of its output.
    pub async fn convert_one(&self, filename: &str, bytes: &[u8]) -> String {
        let response = self
            .post_form("/api/convert", MultipartForm::new().file("files", filename, bytes))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["results"][0]["handle"]
            .as_str()
            .expect("succeeded result carries a handle")
            .to_string()
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            headers,
            bytes,
        }
    }
}

impl From<RawResponse> for TestResponse {
    fn from(raw: RawResponse) -> Self {
        let body = if raw.bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw.bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status: raw.status,
            body,
        }
    }
}
