//! Error types for the optimizer module.

use thiserror::Error;

/// Errors raised while optimizing an SVG document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizationError {
    /// The document could not be parsed as SVG.
    #[error("failed to parse SVG: {0}")]
    Parse(String),

    /// The optimizer itself failed.
    #[error("optimization failed: {0}")]
    Failed(String),
}
