//! Mock renderer for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures;
use crate::renderer::{RenderError, Renderer};

/// Mock implementation of the Renderer trait.
///
/// Returns a small valid PNG for any input that contains an `<svg` element.
#[derive(Debug, Default)]
pub struct MockRenderer {
    calls: AtomicUsize,
    next_error: Arc<RwLock<Option<RenderError>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of render calls.
    pub async fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next render call fail with `error`.
    pub async fn set_next_error(&self, error: RenderError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render_png(&self, document: &[u8]) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if !String::from_utf8_lossy(document).contains("<svg") {
            return Err(RenderError::Failed("input is not an SVG document".to_string()));
        }
        Ok(fixtures::solid_png(4, 4, [0, 0, 0]))
    }
}
