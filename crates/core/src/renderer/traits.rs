//! Trait definitions for the renderer module.

use async_trait::async_trait;

use super::error::RenderError;

/// SVG to PNG rasterizer.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Rasterizes an SVG document into PNG bytes.
    async fn render_png(&self, document: &[u8]) -> Result<Vec<u8>, RenderError>;
}
