//! In-process optimizer built on `usvg`.

use async_trait::async_trait;
use tracing::debug;
use usvg::{Indent, Options, Tree, WriteOptions};

use super::error::OptimizationError;
use super::traits::Optimizer;
use crate::config::OptimizerConfig;

/// Parses the document into a normalized tree and writes it back compactly.
///
/// Normalization drops comments, metadata and editor cruft, resolves styles
/// into attributes and rounds coordinates to the configured precision, or to
/// the requested path precision when that is finer.
pub struct UsvgOptimizer {
    coordinates_precision: u8,
}

impl UsvgOptimizer {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            coordinates_precision: config.coordinates_precision,
        }
    }

    fn optimize_blocking(document: &[u8], precision: u8) -> Result<Vec<u8>, OptimizationError> {
        let tree = Tree::from_data(document, &Options::default())
            .map_err(|e| OptimizationError::Parse(e.to_string()))?;

        let options = WriteOptions {
            indent: Indent::None,
            attributes_indent: Indent::None,
            coordinates_precision: precision,
            transforms_precision: precision,
            ..WriteOptions::default()
        };
        Ok(tree.to_string(&options).into_bytes())
    }
}

impl Default for UsvgOptimizer {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

#[async_trait]
impl Optimizer for UsvgOptimizer {
    fn name(&self) -> &str {
        "usvg"
    }

    async fn optimize(
        &self,
        document: &[u8],
        path_precision: u32,
    ) -> Result<Vec<u8>, OptimizationError> {
        let input = document.to_vec();
        let requested = u8::try_from(path_precision).unwrap_or(u8::MAX);
        let precision = self.coordinates_precision.max(requested);
        let original_len = input.len();

        let output = tokio::task::spawn_blocking(move || Self::optimize_blocking(&input, precision))
            .await
            .map_err(|e| OptimizationError::Failed(e.to_string()))??;

        debug!(before = original_len, after = output.len(), "Optimized SVG");
        Ok(output)
    }
}
