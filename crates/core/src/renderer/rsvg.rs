//! Renderer backed by the `rsvg-convert` command-line tool.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::error::RenderError;
use super::traits::Renderer;
use crate::config::RendererConfig;
use crate::process::{run_tool, ToolError};

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Pipes the document through `rsvg-convert -f png`.
pub struct RsvgRenderer {
    config: RendererConfig,
}

impl RsvgRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Creates a renderer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RendererConfig::default())
    }
}

#[async_trait]
impl Renderer for RsvgRenderer {
    fn name(&self) -> &str {
        "rsvg-convert"
    }

    async fn render_png(&self, document: &[u8]) -> Result<Vec<u8>, RenderError> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        let png = run_tool(&self.config.rsvg_path, ["-f", "png"], Some(document), limit)
            .await
            .map_err(|e| match e {
                ToolError::NotFound(path) => {
                    RenderError::Unavailable(format!("rsvg-convert not found at path: {}", path.display()))
                }
                ToolError::Timeout(limit) => RenderError::Timeout {
                    timeout_secs: limit.as_secs(),
                },
                other => RenderError::Failed(other.to_string()),
            })?;

        if !png.starts_with(PNG_SIGNATURE) {
            return Err(RenderError::InvalidOutput);
        }

        debug!(svg_bytes = document.len(), png_bytes = png.len(), "Rendered PNG");
        Ok(png)
    }
}
