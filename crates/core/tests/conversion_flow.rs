//! Conversion flow integration tests.
//!
//! These tests drive the conversion service end to end with mock engines:
//! - Batch ordering and per-item failure isolation
//! - Preset resolution and optimization fallback
//! - Artifact retention, sweeping and download policies
//! - Remote sources and fetch failures

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tracery_core::{
    testing::{fixtures, MockFetcher, MockOptimizer, MockRenderer, MockTracer},
    ArtifactStore, ConversionRequest, ConversionService, ErrorKind, FsArtifactStore, JobContext,
    MemoryArtifactStore, OutputFormat, ParameterOverrides, ServiceError, ServiceOptions,
};

/// Test helper wiring a service to mocks.
struct TestHarness {
    service: ConversionService,
    tracer: Arc<MockTracer>,
    optimizer: Arc<MockOptimizer>,
    fetcher: Arc<MockFetcher>,
    store: Arc<dyn ArtifactStore>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryArtifactStore::default()), MockFetcher::new())
    }

    fn with_store(store: Arc<dyn ArtifactStore>, fetcher: MockFetcher) -> Self {
        let tracer = Arc::new(MockTracer::new());
        let optimizer = Arc::new(MockOptimizer::new());
        let fetcher = Arc::new(fetcher);
        let ctx = JobContext {
            tracer: tracer.clone(),
            optimizer: optimizer.clone(),
            renderer: Arc::new(MockRenderer::new()),
            fetcher: fetcher.clone(),
            store: Arc::clone(&store),
            retain_uploads: false,
        };
        let service = ConversionService::new(ctx, 4, ServiceOptions::default());

        Self {
            service,
            tracer,
            optimizer,
            fetcher,
            store,
        }
    }

    async fn artifact_bytes(&self, handle: &str) -> Vec<u8> {
        self.service.download(handle).await.expect("artifact").bytes
    }
}

fn upload(name: &str, bytes: Vec<u8>) -> ConversionRequest {
    ConversionRequest::upload(name.to_string(), bytes)
}

// =============================================================================
// Batches
// =============================================================================

#[tokio::test]
async fn test_corrupt_item_fails_alone() {
    let harness = TestHarness::new();

    let batch = harness
        .service
        .convert_upload(vec![
            upload("one.png", fixtures::solid_png(12, 12, [255, 0, 0])),
            upload("two.png", fixtures::truncated_png()),
            upload("three.jpg", fixtures::solid_jpeg(12, 12, [0, 0, 255])),
        ])
        .await
        .unwrap();

    assert_eq!(batch.len(), 3);
    let items = batch.items();
    assert!(items[0].is_success());
    assert!(items[2].is_success());

    let failure = items[1].failure().expect("corrupt upload must fail");
    assert_eq!(failure.kind, ErrorKind::Tracing);
    assert!(failure.message.starts_with("undecodable_image"));
    assert_eq!(items[1].source_name.as_deref(), Some("two.png"));

    let summary = batch.summary();
    assert_eq!((summary.total, summary.succeeded, summary.failed), (3, 2, 1));
}

#[tokio::test]
async fn test_results_keep_request_order_under_uneven_latency() {
    let harness = TestHarness::new();
    let images: Vec<Vec<u8>> = (0..5u8)
        .map(|i| fixtures::solid_png(8, 8, [i * 40, 0, 0]))
        .collect();
    // earlier items finish last
    for (i, image) in images.iter().enumerate() {
        let delay = Duration::from_millis(20 * (5 - i as u64));
        harness.tracer.set_delay_for(image, delay).await;
    }

    let requests = images
        .iter()
        .enumerate()
        .map(|(i, image)| upload(&format!("{i}.png"), image.clone()))
        .collect();
    let batch = harness.service.convert_upload(requests).await.unwrap();

    for (i, item) in batch.items().iter().enumerate() {
        assert_eq!(item.index, i);
        assert_eq!(item.source_name.as_deref(), Some(format!("{i}.png").as_str()));
        assert!(item.is_success());
    }
}

#[tokio::test]
async fn test_single_upload_is_batch_of_one() {
    let harness = TestHarness::new();

    let batch = harness
        .service
        .convert_upload(vec![upload("solo.png", fixtures::solid_png(4, 4, [1, 1, 1]))])
        .await
        .unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.summary().succeeded, 1);
}

// =============================================================================
// Parameters and optimization
// =============================================================================

#[tokio::test]
async fn test_minimal_preset_optimized_is_not_larger() {
    let harness = TestHarness::new();
    let image = fixtures::solid_png(100, 100, [0, 90, 200]);

    let batch = harness
        .service
        .convert_upload(vec![
            upload("opt.png", image.clone()).with_preset("minimal"),
            upload("raw.png", image).with_preset("minimal").with_optimize(false),
        ])
        .await
        .unwrap();

    let optimized = batch.items()[0].output().unwrap();
    let raw = batch.items()[1].output().unwrap();
    assert!(optimized.optimized);
    assert!(!raw.optimized);
    assert!(optimized.size_bytes <= raw.size_bytes);

    let traces = harness.tracer.recorded_traces().await;
    assert!(traces
        .iter()
        .all(|t| t.params.curve_mode() == tracery_core::CurveMode::Polygon));
    assert!(traces.iter().all(|t| t.params.filter_speckle() == 16));
}

#[tokio::test]
async fn test_identical_inputs_produce_identical_outputs() {
    let harness = TestHarness::new();
    let image = fixtures::solid_png(10, 10, [3, 141, 59]);
    let mut overrides = ParameterOverrides::new();
    overrides.set_field("color_precision", "3").unwrap();

    let batch = harness
        .service
        .convert_upload(vec![
            upload("a.png", image.clone()).with_overrides(overrides.clone()),
            upload("b.png", image).with_overrides(overrides),
        ])
        .await
        .unwrap();

    let first = batch.items()[0].output().unwrap().handle.to_string();
    let second = batch.items()[1].output().unwrap().handle.to_string();
    assert_ne!(first, second);
    assert_eq!(
        harness.artifact_bytes(&first).await,
        harness.artifact_bytes(&second).await
    );
}

#[tokio::test]
async fn test_optimizer_outage_does_not_fail_jobs() {
    let harness = TestHarness::new();
    harness.optimizer.set_always_fail(true);

    let batch = harness
        .service
        .convert_upload(vec![
            upload("a.png", fixtures::solid_png(4, 4, [9, 9, 9])),
            upload("b.png", fixtures::solid_png(4, 4, [8, 8, 8])),
        ])
        .await
        .unwrap();

    for item in batch.items() {
        let output = item.output().expect("optimizer failure must not fail the job");
        assert!(!output.optimized);
        assert!(output.warnings[0].contains("optimization skipped"));
    }
}

#[tokio::test]
async fn test_png_output() {
    let harness = TestHarness::new();

    let batch = harness
        .service
        .convert_upload(vec![upload("icon.png", fixtures::solid_png(6, 6, [0, 128, 0]))
            .with_preset("logo")
            .with_format(OutputFormat::Png)])
        .await
        .unwrap();

    let output = batch.items()[0].output().unwrap();
    let artifact = harness.service.download(output.handle.as_str()).await.unwrap();
    assert_eq!(artifact.meta.content_type(), "image/png");
    assert_eq!(artifact.meta.download_name(), "icon.png");
    assert!(image::guess_format(&artifact.bytes).is_ok());
}

// =============================================================================
// Artifacts
// =============================================================================

#[tokio::test]
async fn test_download_after_retention_is_not_found() {
    let store: Arc<dyn ArtifactStore> =
        Arc::new(MemoryArtifactStore::new(chrono::Duration::milliseconds(300)));
    let harness = TestHarness::with_store(store, MockFetcher::new());

    let batch = harness
        .service
        .convert_upload(vec![upload("a.png", fixtures::solid_png(4, 4, [5, 5, 5]))])
        .await
        .unwrap();
    let handle = batch.items()[0].output().unwrap().handle.to_string();
    assert!(harness.service.download(&handle).await.is_ok());

    tokio::time::sleep(Duration::from_millis(450)).await;

    let err = harness.service.download(&handle).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_filesystem_store_sweeps_expired_outputs() {
    let dir = TempDir::new().unwrap();
    let fs_store = Arc::new(
        FsArtifactStore::open(dir.path().join("artifacts"), chrono::Duration::seconds(30))
            .await
            .unwrap(),
    );
    let harness = TestHarness::with_store(fs_store.clone(), MockFetcher::new());

    let batch = harness
        .service
        .convert_upload(vec![
            upload("a.png", fixtures::solid_png(4, 4, [1, 2, 3])),
            upload("b.png", fixtures::solid_png(4, 4, [3, 2, 1])),
        ])
        .await
        .unwrap();
    // staged uploads are released once their jobs finish
    assert_eq!(harness.store.len().await, 2);

    let later = chrono::Utc::now() + chrono::Duration::seconds(31);
    assert_eq!(fs_store.sweep_expired(later).await.unwrap(), 2);

    for item in batch.items() {
        let handle = item.output().unwrap().handle.to_string();
        assert!(matches!(
            harness.service.download(&handle).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(!fs_store.dir().join(&handle).exists());
    }
}

// =============================================================================
// Remote sources
// =============================================================================

#[tokio::test]
async fn test_convert_from_url() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .add_image("https://cdn.example.com/art/logo.png", fixtures::solid_png(8, 8, [7, 7, 7]))
        .await;

    let batch = harness
        .service
        .convert_from_url(vec![ConversionRequest::remote(
            "https://cdn.example.com/art/logo.png",
        )])
        .await
        .unwrap();

    let item = &batch.items()[0];
    assert!(item.is_success());
    assert_eq!(item.source_name.as_deref(), Some("logo.png"));
    assert_eq!(
        harness.fetcher.requested_urls().await,
        ["https://cdn.example.com/art/logo.png"]
    );
}

#[tokio::test]
async fn test_oversized_remote_image_fails_with_fetch_error() {
    let harness = TestHarness::with_store(
        Arc::new(MemoryArtifactStore::default()),
        MockFetcher::new().with_max_bytes(5 * 1024 * 1024),
    );
    harness
        .fetcher
        .add_image("https://example.com/huge.png", vec![0u8; 10 * 1024 * 1024])
        .await;

    let batch = harness
        .service
        .convert_from_url(vec![ConversionRequest::remote("https://example.com/huge.png")])
        .await
        .unwrap();

    let failure = batch.items()[0].failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::Fetch);
    assert!(failure.message.contains("oversized"));
    assert_eq!(harness.tracer.call_count().await, 0);
}
