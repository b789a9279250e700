//! Conversion jobs.
//!
//! A job takes one validated [`JobSpec`] through
//! `Pending -> Fetching -> Tracing -> [Optimizing] -> Finalizing` and ends in
//! `Succeeded` or `Failed`. Optimization only applies to SVG output and never
//! fails a job.

mod runner;
mod state;
mod types;

pub use runner::{ConversionJob, JobContext, RenderedDocument};
pub use state::JobState;
pub use types::{
    ConversionOutcome, ConversionOutput, ConversionRequest, ConversionResult, ImageSource,
    JobSpec, OutputFormat, SourceRef,
};
