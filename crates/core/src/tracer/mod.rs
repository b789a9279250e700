//! Raster-to-vector tracing.
//!
//! The [`Tracer`] trait abstracts the tracing engine. [`VtracerTracer`] drives
//! the `vtracer` command-line tool; tests use the mock in [`crate::testing`].

mod error;
mod traits;
mod vtracer;

pub use error::{TracingError, TracingReason};
pub use traits::Tracer;
pub(crate) use vtracer::inspect_image;
pub use vtracer::VtracerTracer;
