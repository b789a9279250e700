//! Core library for tracery: raster to SVG conversion.
//!
//! The [`service::ConversionService`] is the entry point. It resolves
//! [`params`] from presets and overrides, runs [`job`]s through the
//! [`batch`] coordinator and keeps the results in an
//! [`artifact::ArtifactStore`] until they expire.

pub mod artifact;
pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod optimizer;
pub mod params;
mod process;
pub mod renderer;
pub mod service;
pub mod testing;
pub mod tracer;

pub use artifact::{
    Artifact, ArtifactHandle, ArtifactKind, ArtifactMeta, ArtifactStore, FsArtifactStore,
    MemoryArtifactStore, StoreError,
};
pub use batch::{BatchCoordinator, BatchResult, BatchSummary};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use error::{ErrorKind, JobFailure, ValidationError};
pub use fetcher::{FetchError, FetchedImage, Fetcher, HttpFetcher};
pub use job::{
    ConversionJob, ConversionOutcome, ConversionOutput, ConversionRequest, ConversionResult,
    ImageSource, JobContext, JobState, OutputFormat, RenderedDocument,
};
pub use optimizer::{OptimizationError, Optimizer, UsvgOptimizer};
pub use params::{
    preset, presets, resolve, ColorMode, CurveMode, Hierarchy, ParameterOverrides, ParameterSet,
    Preset, PresetName,
};
pub use renderer::{RenderError, Renderer, RsvgRenderer};
pub use service::{ConversionService, ServiceError, ServiceOptions};
pub use tracer::{Tracer, TracingError, TracingReason, VtracerTracer};
