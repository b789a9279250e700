//! Request and result types for conversion jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::artifact::{ArtifactHandle, ArtifactKind};
use crate::error::JobFailure;
use crate::params::{ParameterOverrides, ParameterSet};

/// Format of the finished artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub(crate) fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Self::Svg => ArtifactKind::GeneratedSvg,
            Self::Png => ArtifactKind::GeneratedPng,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a conversion's input comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Bytes supplied by the caller, with the client-side file name if known.
    Upload { name: Option<String>, bytes: Vec<u8> },
    /// An http(s) URL to download.
    RemoteUrl(String),
}

impl ImageSource {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::RemoteUrl(_) => "url",
        }
    }

    /// Name reported back in results.
    pub fn display_name(&self) -> Option<String> {
        match self {
            Self::Upload { name, .. } => name.clone(),
            Self::RemoteUrl(url) => url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .map(|segment| segment.split(['?', '#']).next().unwrap_or(segment).to_string())
                .filter(|segment| !segment.is_empty()),
        }
    }
}

/// One item of a conversion request, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub source: ImageSource,
    pub preset: Option<String>,
    pub overrides: ParameterOverrides,
    pub format: OutputFormat,
    /// `None` uses the configured default.
    pub optimize: Option<bool>,
}

impl ConversionRequest {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            preset: None,
            overrides: ParameterOverrides::default(),
            format: OutputFormat::Svg,
            optimize: None,
        }
    }

    pub fn upload(name: impl Into<Option<String>>, bytes: Vec<u8>) -> Self {
        Self::new(ImageSource::Upload {
            name: name.into(),
            bytes,
        })
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::new(ImageSource::RemoteUrl(url.into()))
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn with_overrides(mut self, overrides: ParameterOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = Some(optimize);
        self
    }
}

/// Input of a validated job.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef {
    /// Upload staged in the artifact store.
    Stored(ArtifactHandle),
    /// URL fetched when the job runs.
    Remote(String),
}

/// A fully validated unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Position of the item in its request.
    pub index: usize,
    pub source: SourceRef,
    pub source_name: Option<String>,
    pub params: ParameterSet,
    pub format: OutputFormat,
    pub optimize: bool,
}

/// Output of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutput {
    pub handle: ArtifactHandle,
    pub format: OutputFormat,
    pub size_bytes: u64,
    pub input_size_bytes: u64,
    /// Whether the stored document is the optimizer's output.
    pub optimized: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Terminal outcome of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Succeeded(ConversionOutput),
    Failed { error: JobFailure },
}

/// Per-item result, reported at the item's request position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

impl ConversionResult {
    pub fn failed(index: usize, source_name: Option<String>, error: JobFailure) -> Self {
        Self {
            index,
            source_name,
            outcome: ConversionOutcome::Failed { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Succeeded(_))
    }

    pub fn output(&self) -> Option<&ConversionOutput> {
        match &self.outcome {
            ConversionOutcome::Succeeded(output) => Some(output),
            ConversionOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.outcome {
            ConversionOutcome::Succeeded(_) => None,
            ConversionOutcome::Failed { error } => Some(error),
        }
    }
}
