//! Trait definitions for the tracer module.

use async_trait::async_trait;

use super::error::TracingError;
use crate::params::ParameterSet;

/// A raster-to-vector tracing engine.
///
/// Implementations must be deterministic: identical bytes and parameters
/// produce an identical SVG document.
#[async_trait]
pub trait Tracer: Send + Sync {
    /// Returns the name of this tracer implementation.
    fn name(&self) -> &str;

    /// Traces a raster image into an SVG document.
    async fn trace(&self, image: &[u8], params: &ParameterSet) -> Result<Vec<u8>, TracingError>;

    /// Checks that the engine is available.
    async fn validate(&self) -> Result<(), TracingError> {
        Ok(())
    }
}
