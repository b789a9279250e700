//! Executes a single conversion job through the pipeline stages.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::JobState;
use super::types::{
    ConversionOutcome, ConversionOutput, ConversionResult, JobSpec, OutputFormat, SourceRef,
};
use crate::artifact::{ArtifactStore, StoreError};
use crate::error::{ErrorKind, JobFailure};
use crate::fetcher::{FetchError, Fetcher};
use crate::metrics;
use crate::optimizer::Optimizer;
use crate::renderer::{RenderError, Renderer};
use crate::tracer::{Tracer, TracingError};

/// Collaborators shared by every job.
#[derive(Clone)]
pub struct JobContext {
    pub tracer: Arc<dyn Tracer>,
    pub optimizer: Arc<dyn Optimizer>,
    pub renderer: Arc<dyn Renderer>,
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn ArtifactStore>,
    /// Keep staged uploads after the job finishes.
    pub retain_uploads: bool,
}

/// Stage failures. Optimization is absent: it never fails a job.
#[derive(Debug, Error)]
enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Tracing(#[from] TracingError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StageError {
    fn into_failure(self) -> JobFailure {
        let kind = match &self {
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Tracing(_) => ErrorKind::Tracing,
            Self::Render(_) => ErrorKind::Render,
            Self::Store(e) if e.is_not_found() => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Storage,
        };
        JobFailure::new(kind, self.to_string())
    }
}

/// Result of the optimization stage.
///
/// Either the optimizer's output or the untouched document, never an error.
#[derive(Debug)]
pub(crate) struct OptimizedDocument {
    pub bytes: Vec<u8>,
    pub optimized: bool,
    pub warning: Option<String>,
}

impl OptimizedDocument {
    fn unoptimized(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            optimized: false,
            warning: None,
        }
    }
}

/// Runs the optimizer, keeping the original document on failure or when the
/// rewrite is not smaller.
pub(crate) async fn optimize_document(
    optimizer: &dyn Optimizer,
    document: Vec<u8>,
    path_precision: u32,
) -> OptimizedDocument {
    match optimizer.optimize(&document, path_precision).await {
        Ok(bytes) if bytes.len() <= document.len() => OptimizedDocument {
            bytes,
            optimized: true,
            warning: None,
        },
        Ok(bytes) => {
            debug!(
                before = document.len(),
                after = bytes.len(),
                "Optimizer output is larger, keeping original"
            );
            OptimizedDocument::unoptimized(document)
        }
        Err(e) => {
            metrics::OPTIMIZER_FALLBACKS.inc();
            warn!(optimizer = optimizer.name(), error = %e, "Optimization failed, keeping original");
            OptimizedDocument {
                bytes: document,
                optimized: false,
                warning: Some(format!("optimization skipped: {}", e)),
            }
        }
    }
}

/// Finished document, before it is stored.
#[derive(Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub input_size_bytes: u64,
    pub optimized: bool,
}

/// A single conversion job.
///
/// Owns its state machine; [`run`](Self::run) drives it from `Pending` to a
/// terminal state and always produces a [`ConversionResult`]. A finished job
/// never runs again.
pub struct ConversionJob {
    id: String,
    spec: JobSpec,
    state: JobState,
    history: Vec<JobState>,
    warnings: Vec<String>,
    result: Option<ConversionResult>,
}

impl ConversionJob {
    pub fn new(spec: JobSpec) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            spec,
            state: JobState::Pending,
            history: vec![JobState::Pending],
            warnings: Vec::new(),
            result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state the job has been in, in order.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    fn transition(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            warn!(job_id = %self.id, from = %self.state, to = %next, "Ignoring illegal job transition");
            return;
        }
        debug!(job_id = %self.id, from = %self.state, to = %next, "Job transition");
        self.state = next;
        self.history.push(next);
    }

    fn already_finished(&self) -> JobFailure {
        JobFailure::new(
            ErrorKind::Internal,
            format!("job {} already {}", self.id, self.state),
        )
    }

    /// Runs the job to completion and stores its output.
    ///
    /// Calling it again on a finished job returns the first result.
    pub async fn run(&mut self, ctx: &JobContext) -> ConversionResult {
        if self.state.is_terminal() {
            return self.result.clone().unwrap_or_else(|| ConversionResult {
                index: self.spec.index,
                source_name: self.spec.source_name.clone(),
                outcome: ConversionOutcome::Failed {
                    error: self.already_finished(),
                },
            });
        }

        let started = Instant::now();
        let outcome = match self.execute(ctx).await {
            Ok(output) => {
                self.transition(JobState::Succeeded);
                info!(
                    job_id = %self.id,
                    index = self.spec.index,
                    handle = %output.handle,
                    size = output.size_bytes,
                    "Conversion succeeded"
                );
                ConversionOutcome::Succeeded(output)
            }
            Err(e) => {
                self.transition(JobState::Failed);
                let failure = e.into_failure();
                warn!(job_id = %self.id, index = self.spec.index, error = %failure, "Conversion failed");
                ConversionOutcome::Failed { error: failure }
            }
        };

        self.release_source(ctx).await;

        let status = self.state.as_str();
        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[status, self.spec.format.as_str()])
            .inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());

        let result = ConversionResult {
            index: self.spec.index,
            source_name: self.spec.source_name.clone(),
            outcome,
        };
        self.result = Some(result.clone());
        result
    }

    /// Runs the pipeline up to the finished document without storing it.
    pub async fn render(&mut self, ctx: &JobContext) -> Result<RenderedDocument, JobFailure> {
        if self.state.is_terminal() {
            return Err(self.already_finished());
        }
        let result = self.produce(ctx).await;
        self.release_source(ctx).await;
        match result {
            Ok(document) => {
                self.transition(JobState::Succeeded);
                Ok(document)
            }
            Err(e) => {
                self.transition(JobState::Failed);
                Err(e.into_failure())
            }
        }
    }

    /// Warnings collected while the job ran.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    async fn execute(&mut self, ctx: &JobContext) -> Result<ConversionOutput, StageError> {
        let document = self.produce(ctx).await?;
        let size_bytes = document.bytes.len() as u64;
        let handle = ctx
            .store
            .put_named(
                document.bytes,
                document.format.artifact_kind(),
                self.spec.source_name.clone(),
            )
            .await?;

        Ok(ConversionOutput {
            handle,
            format: document.format,
            size_bytes,
            input_size_bytes: document.input_size_bytes,
            optimized: document.optimized,
            warnings: self.warnings.clone(),
        })
    }

    async fn produce(&mut self, ctx: &JobContext) -> Result<RenderedDocument, StageError> {
        self.transition(JobState::Fetching);
        let input = match &self.spec.source {
            SourceRef::Stored(handle) => ctx.store.get(handle).await?.bytes,
            SourceRef::Remote(url) => ctx.fetcher.fetch(url).await?.bytes,
        };
        let input_size_bytes = input.len() as u64;

        self.transition(JobState::Tracing);
        let svg = ctx.tracer.trace(&input, &self.spec.params).await?;
        drop(input);

        let document = if self.spec.format == OutputFormat::Svg && self.spec.optimize {
            self.transition(JobState::Optimizing);
            optimize_document(ctx.optimizer.as_ref(), svg, self.spec.params.path_precision()).await
        } else {
            OptimizedDocument::unoptimized(svg)
        };
        if let Some(warning) = document.warning {
            self.warnings.push(warning);
        }

        self.transition(JobState::Finalizing);
        let bytes = match self.spec.format {
            OutputFormat::Svg => document.bytes,
            OutputFormat::Png => ctx.renderer.render_png(&document.bytes).await?,
        };

        Ok(RenderedDocument {
            bytes,
            format: self.spec.format,
            input_size_bytes,
            optimized: document.optimized,
        })
    }

    async fn release_source(&self, ctx: &JobContext) {
        if ctx.retain_uploads {
            return;
        }
        if let SourceRef::Stored(handle) = &self.spec.source {
            if let Err(e) = ctx.store.delete(handle).await {
                warn!(job_id = %self.id, %handle, error = %e, "Failed to release staged upload");
            }
        }
    }
}
