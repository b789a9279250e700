//! Error types for the renderer module.

use thiserror::Error;

/// Errors raised while rasterizing an SVG document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The rasterizer binary could not be started.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// The rasterizer rejected the document or crashed.
    #[error("render failed: {0}")]
    Failed(String),

    /// The rasterizer did not finish in time.
    #[error("render timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The rasterizer produced something that is not a PNG.
    #[error("renderer produced invalid PNG output")]
    InvalidOutput,
}
