//! Trait definitions for the optimizer module.

use async_trait::async_trait;

use super::error::OptimizationError;

/// Size-reducing SVG rewriter.
///
/// The output must render identically to the input. Callers treat a failure
/// as non-fatal and keep the original document.
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Returns the name of this optimizer implementation.
    fn name(&self) -> &str;

    /// Rewrites an SVG document, usually into a smaller one.
    ///
    /// `path_precision` is the number of decimal places the tracer was asked
    /// to keep; the rewrite must not round coordinates more coarsely.
    async fn optimize(&self, document: &[u8], path_precision: u32)
        -> Result<Vec<u8>, OptimizationError>;
}
