//! Batch coordinator.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::{ErrorKind, JobFailure};
use crate::job::{ConversionJob, ConversionResult, JobContext, JobSpec};
use crate::metrics;

/// Counts derived from a batch's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Ordered per-item results of a batch.
///
/// `items()[i]` is always the result of the `i`-th requested item.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    items: Vec<ConversionResult>,
}

impl BatchResult {
    pub fn new(items: Vec<ConversionResult>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ConversionResult] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ConversionResult> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.items.iter().filter(|item| item.is_success()).count();
        BatchSummary {
            total: self.items.len(),
            succeeded,
            failed: self.items.len() - succeeded,
        }
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchResult", 2)?;
        state.serialize_field("results", &self.items)?;
        state.serialize_field("summary", &self.summary())?;
        state.end()
    }
}

/// Runs jobs concurrently under a global parallelism limit.
///
/// The limit is shared by every batch submitted to the same coordinator, so
/// concurrent requests cannot exceed it together. Results are collected in
/// request order regardless of completion order; one job's failure or panic
/// does not affect its siblings.
pub struct BatchCoordinator {
    ctx: Arc<JobContext>,
    semaphore: Arc<Semaphore>,
    max_parallel: usize,
}

impl BatchCoordinator {
    pub fn new(ctx: JobContext, max_parallel_jobs: usize) -> Self {
        let max_parallel = max_parallel_jobs.max(1);
        Self {
            ctx: Arc::new(ctx),
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            max_parallel,
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Jobs currently holding a slot.
    pub fn active_jobs(&self) -> usize {
        self.max_parallel - self.semaphore.available_permits()
    }

    /// Runs every spec and returns their results in input order.
    pub async fn run_batch(&self, specs: Vec<JobSpec>) -> BatchResult {
        let total = specs.len();
        metrics::BATCH_SIZE.observe(total as f64);
        info!(items = total, max_parallel = self.max_parallel, "Starting batch");

        let mut slots = Vec::with_capacity(total);
        let mut tasks = Vec::with_capacity(total);
        for spec in specs {
            slots.push((spec.index, spec.source_name.clone()));
            let ctx = Arc::clone(&self.ctx);
            let semaphore = Arc::clone(&self.semaphore);
            tasks.push(tokio::spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                ConversionJob::new(spec).run(&ctx).await
            }));
        }

        let joined = futures::future::join_all(tasks).await;
        let items: Vec<ConversionResult> = joined
            .into_iter()
            .zip(slots)
            .map(|(joined, (index, source_name))| {
                joined.unwrap_or_else(|e| {
                    error!(index, error = %e, "Conversion task panicked");
                    ConversionResult::failed(
                        index,
                        source_name,
                        JobFailure::new(ErrorKind::Internal, format!("job aborted: {}", e)),
                    )
                })
            })
            .collect();

        let result = BatchResult::new(items);
        let summary = result.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryArtifactStore;
    use crate::job::{OutputFormat, SourceRef};
    use crate::params::resolve;
    use crate::testing::{fixtures, MockFetcher, MockOptimizer, MockRenderer, MockTracer};
    use std::time::Duration;

    fn context(tracer: Arc<MockTracer>, fetcher: Arc<MockFetcher>) -> JobContext {
        JobContext {
            tracer,
            optimizer: Arc::new(MockOptimizer::new()),
            renderer: Arc::new(MockRenderer::new()),
            fetcher,
            store: Arc::new(MemoryArtifactStore::default()),
            retain_uploads: false,
        }
    }

    fn remote_spec(index: usize, url: &str) -> JobSpec {
        JobSpec {
            index,
            source: SourceRef::Remote(url.to_string()),
            source_name: Some(url.to_string()),
            params: resolve(None, None).unwrap(),
            format: OutputFormat::Svg,
            optimize: true,
        }
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        let tracer = Arc::new(MockTracer::new());
        let fetcher = Arc::new(MockFetcher::new());
        let slow = fixtures::solid_png(4, 4, [255, 0, 0]);
        let fast = fixtures::solid_png(4, 4, [0, 255, 0]);
        fetcher.add_image("http://img/slow.png", slow.clone()).await;
        fetcher.add_image("http://img/fast.png", fast).await;
        tracer.set_delay_for(&slow, Duration::from_millis(150)).await;

        let coordinator = BatchCoordinator::new(context(tracer, fetcher), 4);
        let result = coordinator
            .run_batch(vec![
                remote_spec(0, "http://img/slow.png"),
                remote_spec(1, "http://img/fast.png"),
            ])
            .await;

        let names: Vec<_> = result
            .items()
            .iter()
            .map(|item| item.source_name.clone().unwrap())
            .collect();
        assert_eq!(names, ["http://img/slow.png", "http://img/fast.png"]);
        assert_eq!(result.items()[0].index, 0);
        assert_eq!(result.summary().succeeded, 2);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let tracer = Arc::new(MockTracer::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.add_image("http://img/a.png", fixtures::solid_png(2, 2, [1, 2, 3])).await;
        fetcher.add_image("http://img/c.png", fixtures::solid_png(2, 2, [4, 5, 6])).await;

        let coordinator = BatchCoordinator::new(context(tracer, fetcher), 2);
        let result = coordinator
            .run_batch(vec![
                remote_spec(0, "http://img/a.png"),
                remote_spec(1, "http://img/missing.png"),
                remote_spec(2, "http://img/c.png"),
            ])
            .await;

        assert!(result.items()[0].is_success());
        assert_eq!(result.items()[1].failure().unwrap().kind, ErrorKind::Fetch);
        assert!(result.items()[2].is_success());
        assert_eq!(
            result.summary(),
            BatchSummary {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded() {
        let tracer = Arc::new(MockTracer::new());
        let fetcher = Arc::new(MockFetcher::new());
        let image = fixtures::solid_png(2, 2, [9, 9, 9]);
        tracer.set_delay_for(&image, Duration::from_millis(50)).await;
        let mut specs = Vec::new();
        for i in 0..6 {
            let url = format!("http://img/{i}.png");
            fetcher.add_image(&url, image.clone()).await;
            specs.push(remote_spec(i, &url));
        }

        let coordinator = BatchCoordinator::new(context(tracer.clone(), fetcher), 2);
        let result = coordinator.run_batch(specs).await;

        assert_eq!(result.summary().succeeded, 6);
        assert!(tracer.max_concurrent().await <= 2);
        assert_eq!(coordinator.active_jobs(), 0);
    }

    #[test]
    fn test_serializes_results_and_summary() {
        let result = BatchResult::new(vec![ConversionResult::failed(
            0,
            None,
            JobFailure::new(ErrorKind::Fetch, "timed out after 30 seconds"),
        )]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["results"][0]["status"], "failed");
    }
}
