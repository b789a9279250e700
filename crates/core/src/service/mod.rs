//! Conversion service facade.
//!
//! [`ConversionService`] is the single entry point used by the HTTP API and
//! the CLI. It validates whole requests up front, stages uploads, hands the
//! jobs to the [`BatchCoordinator`] and serves finished artifacts.

mod error;

pub use error::ServiceError;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactHandle, ArtifactKind, ArtifactStore};
use crate::batch::{BatchCoordinator, BatchResult};
use crate::config::Config;
use crate::error::ValidationError;
use crate::fetcher::{FetchError, HttpFetcher};
use crate::job::{
    ConversionJob, ConversionRequest, ImageSource, JobContext, JobSpec, OutputFormat,
    RenderedDocument, SourceRef,
};
use crate::optimizer::UsvgOptimizer;
use crate::params::{presets, resolve, ParameterSet, Preset};
use crate::renderer::RsvgRenderer;
use crate::tracer::VtracerTracer;

/// Request-level policies.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Largest number of items accepted in one request.
    pub max_items: usize,
    /// Optimize SVG output when a request does not say.
    pub optimize_by_default: bool,
    /// Remove generated artifacts once downloaded.
    pub delete_after_download: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_items: 50,
            optimize_by_default: true,
            delete_after_download: false,
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_items: config.batch.max_items,
            optimize_by_default: config.optimizer.enabled,
            delete_after_download: config.storage.delete_after_download,
        }
    }
}

/// Item that passed validation but has not been staged yet.
struct PreparedItem {
    source: ImageSource,
    params: ParameterSet,
    format: OutputFormat,
    optimize: bool,
}

/// Which source variant a request entry point accepts.
#[derive(Clone, Copy)]
enum Expected {
    Upload,
    Url,
}

impl Expected {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Url => "url",
        }
    }
}

pub struct ConversionService {
    coordinator: BatchCoordinator,
    options: ServiceOptions,
}

impl ConversionService {
    pub fn new(ctx: JobContext, max_parallel_jobs: usize, options: ServiceOptions) -> Self {
        Self {
            coordinator: BatchCoordinator::new(ctx, max_parallel_jobs),
            options,
        }
    }

    /// Builds a service wired to the production adapters.
    pub fn from_config(config: &Config, store: Arc<dyn ArtifactStore>) -> Result<Self, FetchError> {
        let ctx = JobContext {
            tracer: Arc::new(VtracerTracer::new(config.tracer.clone())),
            optimizer: Arc::new(UsvgOptimizer::new(&config.optimizer)),
            renderer: Arc::new(RsvgRenderer::new(config.renderer.clone())),
            fetcher: Arc::new(HttpFetcher::new(config.fetch.clone())?),
            store,
            retain_uploads: config.storage.retain_uploads,
        };
        Ok(Self::new(
            ctx,
            config.batch.max_parallel_jobs,
            ServiceOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn context(&self) -> &JobContext {
        self.coordinator.context()
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.context().store
    }

    /// Jobs currently running.
    pub fn active_jobs(&self) -> usize {
        self.coordinator.active_jobs()
    }

    /// Converts uploaded images. A single upload is a batch of one.
    pub async fn convert_upload(
        &self,
        requests: Vec<ConversionRequest>,
    ) -> Result<BatchResult, ServiceError> {
        self.convert(requests, Expected::Upload).await
    }

    /// Converts images fetched from URLs.
    pub async fn convert_from_url(
        &self,
        requests: Vec<ConversionRequest>,
    ) -> Result<BatchResult, ServiceError> {
        self.convert(requests, Expected::Url).await
    }

    /// Runs one request without storing its output.
    ///
    /// Job failures are reported as [`ServiceError::Conversion`].
    pub async fn preview(&self, request: ConversionRequest) -> Result<RenderedDocument, ServiceError> {
        let mut specs = self.stage(self.prepare(vec![request], None)?).await?;
        let spec = specs.pop().ok_or(ValidationError::NoInputs)?;
        let mut job = ConversionJob::new(spec);
        job.render(self.context())
            .await
            .map_err(ServiceError::Conversion)
    }

    /// Lists the presets and their full parameter sets.
    pub fn list_presets(&self) -> &'static [Preset] {
        presets()
    }

    /// Fetches a generated artifact by its handle.
    pub async fn download(&self, handle: &str) -> Result<Artifact, ServiceError> {
        let handle = ArtifactHandle::parse(handle)
            .map_err(|_| ServiceError::NotFound(handle.to_string()))?;
        let artifact = self.store().get(&handle).await?;
        if artifact.meta.kind == ArtifactKind::Upload {
            return Err(ServiceError::NotFound(handle.to_string()));
        }

        if self.options.delete_after_download {
            if let Err(e) = self.store().delete(&handle).await {
                warn!(%handle, error = %e, "Failed to delete downloaded artifact");
            }
        }
        debug!(%handle, size = artifact.meta.size_bytes, "Serving artifact");
        Ok(artifact)
    }

    async fn convert(
        &self,
        requests: Vec<ConversionRequest>,
        expected: Expected,
    ) -> Result<BatchResult, ServiceError> {
        let prepared = self.prepare(requests, Some(expected))?;
        let specs = self.stage(prepared).await?;
        info!(items = specs.len(), source = expected.as_str(), "Accepted conversion request");
        Ok(self.coordinator.run_batch(specs).await)
    }

    /// Validates every item before any work starts.
    fn prepare(
        &self,
        requests: Vec<ConversionRequest>,
        expected: Option<Expected>,
    ) -> Result<Vec<PreparedItem>, ValidationError> {
        if requests.is_empty() {
            return Err(ValidationError::NoInputs);
        }
        if requests.len() > self.options.max_items {
            return Err(ValidationError::TooManyItems {
                count: requests.len(),
                max: self.options.max_items,
            });
        }

        requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                match (&request.source, expected) {
                    (ImageSource::Upload { .. }, Some(Expected::Url))
                    | (ImageSource::RemoteUrl(_), Some(Expected::Upload)) => {
                        return Err(ValidationError::SourceMismatch {
                            index,
                            expected: expected.map_or("", |e| e.as_str()),
                        });
                    }
                    _ => {}
                }
                match &request.source {
                    ImageSource::Upload { bytes, .. } if bytes.is_empty() => {
                        return Err(ValidationError::EmptySource { index });
                    }
                    ImageSource::RemoteUrl(url) => validate_url(url)?,
                    ImageSource::Upload { .. } => {}
                }

                let params = resolve(request.preset.as_deref(), Some(&request.overrides))?;
                Ok(PreparedItem {
                    optimize: request.optimize.unwrap_or(self.options.optimize_by_default),
                    source: request.source,
                    params,
                    format: request.format,
                })
            })
            .collect()
    }

    /// Stages uploads in the store and builds job specs.
    ///
    /// On a storage failure the uploads staged so far are removed again.
    async fn stage(&self, prepared: Vec<PreparedItem>) -> Result<Vec<JobSpec>, ServiceError> {
        let mut specs: Vec<JobSpec> = Vec::with_capacity(prepared.len());
        for (index, item) in prepared.into_iter().enumerate() {
            let source_name = item.source.display_name();
            let source = match item.source {
                ImageSource::Upload { name, bytes } => {
                    match self.store().put_named(bytes, ArtifactKind::Upload, name).await {
                        Ok(handle) => SourceRef::Stored(handle),
                        Err(e) => {
                            self.unstage(&specs).await;
                            return Err(e.into());
                        }
                    }
                }
                ImageSource::RemoteUrl(url) => SourceRef::Remote(url),
            };
            specs.push(JobSpec {
                index,
                source,
                source_name,
                params: item.params,
                format: item.format,
                optimize: item.optimize,
            });
        }
        Ok(specs)
    }

    async fn unstage(&self, specs: &[JobSpec]) {
        for spec in specs {
            if let SourceRef::Stored(handle) = &spec.source {
                let _ = self.store().delete(handle).await;
            }
        }
    }
}

fn validate_url(raw: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = reqwest::Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryArtifactStore;
    use crate::error::ErrorKind;
    use crate::params::ParameterOverrides;
    use crate::testing::{fixtures, MockFetcher, MockOptimizer, MockRenderer, MockTracer};

    fn service_with(options: ServiceOptions) -> (ConversionService, Arc<MemoryArtifactStore>, Arc<MockTracer>) {
        let store = Arc::new(MemoryArtifactStore::default());
        let tracer = Arc::new(MockTracer::new());
        let ctx = JobContext {
            tracer: tracer.clone(),
            optimizer: Arc::new(MockOptimizer::new()),
            renderer: Arc::new(MockRenderer::new()),
            fetcher: Arc::new(MockFetcher::new()),
            store: store.clone(),
            retain_uploads: false,
        };
        (ConversionService::new(ctx, 2, options), store, tracer)
    }

    fn service() -> (ConversionService, Arc<MemoryArtifactStore>, Arc<MockTracer>) {
        service_with(ServiceOptions::default())
    }

    fn upload(name: &str) -> ConversionRequest {
        ConversionRequest::upload(name.to_string(), fixtures::solid_png(6, 6, [0, 0, 255]))
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let (service, _, _) = service();
        let err = service.convert_upload(vec![]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::NoInputs)));
    }

    #[tokio::test]
    async fn test_invalid_item_rejects_whole_request() {
        let (service, store, tracer) = service();
        let mut bad = ParameterOverrides::new();
        bad.set_field("color_precision", "12").unwrap();

        let err = service
            .convert_upload(vec![upload("a.png"), upload("b.png").with_overrides(bad)])
            .await
            .unwrap_err();

        assert_eq!(err.validation_field(), Some("color_precision"));
        assert!(store.is_empty().await);
        assert_eq!(tracer.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_preset_is_validation_error() {
        let (service, _, _) = service();
        let err = service
            .convert_upload(vec![upload("a.png").with_preset("watercolor")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::UnknownPreset(ref name)) if name == "watercolor"
        ));
    }

    #[tokio::test]
    async fn test_too_many_items() {
        let (service, _, _) = service_with(ServiceOptions {
            max_items: 2,
            ..Default::default()
        });
        let err = service
            .convert_upload(vec![upload("a"), upload("b"), upload("c")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::TooManyItems { count: 3, max: 2 })
        ));
    }

    #[tokio::test]
    async fn test_url_validation() {
        let (service, _, _) = service();
        for url in ["ftp://example.com/a.png", "not a url", "file:///etc/passwd"] {
            let err = service
                .convert_from_url(vec![ConversionRequest::remote(url)])
                .await
                .unwrap_err();
            assert!(
                matches!(err, ServiceError::Validation(ValidationError::InvalidUrl { .. })),
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn test_source_must_match_entry_point() {
        let (service, _, _) = service();
        let err = service
            .convert_from_url(vec![upload("a.png")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::SourceMismatch { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let (service, _, _) = service();
        let err = service
            .convert_upload(vec![ConversionRequest::upload(None, Vec::new())])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::EmptySource { index: 0 })
        ));
    }

    #[tokio::test]
    async fn test_download_roundtrip_and_unknown_handle() {
        let (service, _, _) = service();
        let batch = service.convert_upload(vec![upload("logo.png")]).await.unwrap();
        let handle = batch.items()[0].output().unwrap().handle.clone();

        let artifact = service.download(handle.as_str()).await.unwrap();
        assert_eq!(artifact.meta.content_type(), "image/svg+xml");
        assert_eq!(artifact.meta.download_name(), "logo.svg");

        let missing = service
            .download("0123456789abcdef0123456789abcdef.svg")
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
        let garbage = service.download("../../etc/passwd").await.unwrap_err();
        assert!(matches!(garbage, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_after_download() {
        let (service, _, _) = service_with(ServiceOptions {
            delete_after_download: true,
            ..Default::default()
        });
        let batch = service.convert_upload(vec![upload("x.png")]).await.unwrap();
        let handle = batch.items()[0].output().unwrap().handle.to_string();

        service.download(&handle).await.unwrap();
        assert!(matches!(
            service.download(&handle).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_preview_stores_nothing() {
        let (service, store, _) = service();
        let document = service.preview(upload("p.png")).await.unwrap();
        assert!(String::from_utf8(document.bytes).unwrap().contains("<svg"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_preview_reports_job_failure() {
        let (service, _, _) = service();
        let err = service
            .preview(ConversionRequest::upload(None, b"not an image".to_vec()))
            .await
            .unwrap_err();
        match err {
            ServiceError::Conversion(failure) => assert_eq!(failure.kind, ErrorKind::Tracing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_presets() {
        let (service, _, _) = service();
        let names: Vec<_> = service.list_presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["default", "logo", "photo", "line-art", "sketch", "minimal"]);
    }
}
