//! Tracer backed by the `vtracer` command-line tool.

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{TracingError, TracingReason};
use super::traits::Tracer;
use crate::config::TracerConfig;
use crate::params::{ColorMode, CurveMode, ParameterSet};
use crate::process::{run_tool, ToolError};

/// Largest `--filter_speckle` the command-line tool accepts.
const MAX_FILTER_SPECKLE: u32 = 16;
/// Largest `--gradient_step` the command-line tool accepts.
const MAX_GRADIENT_STEP: u32 = 255;
/// Accepted `--segment_length` range.
const SEGMENT_LENGTH_RANGE: (f64, f64) = (3.5, 10.0);

/// Runs `vtracer` on a scratch copy of the image.
///
/// The command-line tool aborts on some values the parameter model allows, so
/// those are clamped into its accepted ranges before the call. `max_iterations`
/// has no command-line flag, so the engine's own default is used for it.
pub struct VtracerTracer {
    config: TracerConfig,
}

impl VtracerTracer {
    pub fn new(config: TracerConfig) -> Self {
        Self { config }
    }

    /// Creates a tracer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Builds vtracer arguments for one trace.
    fn build_args(&self, input: &Path, output: &Path, params: &ParameterSet) -> Vec<String> {
        let colormode = match params.color_mode() {
            ColorMode::Color => "color",
            ColorMode::Binary => "bw",
        };
        let mode = match params.curve_mode() {
            CurveMode::Spline => "spline",
            CurveMode::Polygon => "polygon",
            CurveMode::None => "pixel",
        };

        let filter_speckle = params.filter_speckle().min(MAX_FILTER_SPECKLE);
        let gradient_step = params.layer_difference().min(MAX_GRADIENT_STEP);
        let (min_segment, max_segment) = SEGMENT_LENGTH_RANGE;
        let segment_length = params.length_threshold().clamp(min_segment, max_segment);
        if filter_speckle != params.filter_speckle()
            || gradient_step != params.layer_difference()
            || segment_length != params.length_threshold()
        {
            debug!(
                filter_speckle,
                gradient_step, segment_length, "Clamped parameters to vtracer's accepted ranges"
            );
        }

        vec![
            "--input".to_string(),
            input.to_string_lossy().into_owned(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
            "--colormode".to_string(),
            colormode.to_string(),
            "--hierarchical".to_string(),
            params.hierarchical().as_str().to_string(),
            "--mode".to_string(),
            mode.to_string(),
            "--filter_speckle".to_string(),
            filter_speckle.to_string(),
            "--color_precision".to_string(),
            params.color_precision().to_string(),
            "--gradient_step".to_string(),
            gradient_step.to_string(),
            "--corner_threshold".to_string(),
            params.corner_threshold().to_string(),
            "--segment_length".to_string(),
            segment_length.to_string(),
            "--splice_threshold".to_string(),
            params.splice_threshold().to_string(),
            "--path_precision".to_string(),
            params.path_precision().to_string(),
        ]
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn map_tool_error(&self, err: ToolError) -> TracingError {
        match err {
            ToolError::NotFound(path) => TracingError::new(
                TracingReason::EngineUnavailable,
                format!("vtracer not found at path: {}", path.display()),
            ),
            ToolError::Timeout(limit) => TracingError::new(
                TracingReason::Timeout,
                format!("vtracer timed out after {} seconds", limit.as_secs()),
            ),
            ToolError::Failed { .. } => TracingError::engine_failed(err.to_string()),
            ToolError::Io(e) => TracingError::from(e),
        }
    }
}

/// Format and size of a raster input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageInfo {
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Checks that the bytes are a decodable raster image.
pub(crate) fn inspect_image(image: &[u8]) -> Result<ImageInfo, TracingError> {
    let format = image::guess_format(image)
        .map_err(|_| TracingError::unsupported_format("input is not a recognized image format"))?;

    let (width, height) = image::ImageReader::with_format(Cursor::new(image), format)
        .into_dimensions()
        .map_err(|e| TracingError::undecodable(e.to_string()))?;

    Ok(ImageInfo {
        extension: format.extensions_str().first().copied().unwrap_or("img"),
        width,
        height,
    })
}

async fn remove_scratch(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

#[async_trait]
impl Tracer for VtracerTracer {
    fn name(&self) -> &str {
        "vtracer"
    }

    async fn trace(&self, image: &[u8], params: &ParameterSet) -> Result<Vec<u8>, TracingError> {
        let extension = inspect_image(image)?.extension;

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let stem = Uuid::new_v4().simple().to_string();
        let input: PathBuf = self.config.temp_dir.join(format!("{}.{}", stem, extension));
        let output: PathBuf = self.config.temp_dir.join(format!("{}.svg", stem));

        tokio::fs::write(&input, image).await?;
        let args = self.build_args(&input, &output, params);
        debug!(input = %input.display(), "Running vtracer");

        let result = run_tool(&self.config.vtracer_path, &args, None, self.timeout()).await;
        let document = match result {
            Ok(_) => tokio::fs::read(&output).await.map_err(TracingError::from),
            Err(e) => Err(self.map_tool_error(e)),
        };

        remove_scratch(&input).await;
        remove_scratch(&output).await;

        let document = document?;
        if !looks_like_svg(&document) {
            return Err(TracingError::new(
                TracingReason::InvalidOutput,
                "vtracer output is not an SVG document",
            ));
        }
        Ok(document)
    }

    async fn validate(&self) -> Result<(), TracingError> {
        run_tool(
            &self.config.vtracer_path,
            ["--version"],
            None,
            Duration::from_secs(10),
        )
        .await
        .map(|_| ())
        .map_err(|e| self.map_tool_error(e))
    }
}

fn looks_like_svg(document: &[u8]) -> bool {
    let head = &document[..document.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}
