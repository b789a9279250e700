//! Mock optimizer for testing.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::optimizer::{OptimizationError, Optimizer};

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

/// Mock implementation of the Optimizer trait.
///
/// Strips comments and whitespace between tags, which is enough to make
/// documents from [`MockTracer`](super::MockTracer) strictly smaller.
#[derive(Debug, Default)]
pub struct MockOptimizer {
    calls: AtomicUsize,
    last_precision: AtomicU32,
    next_error: Arc<RwLock<Option<String>>>,
    always_fail: AtomicBool,
}

impl MockOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of optimize calls.
    pub async fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Path precision passed to the most recent optimize call.
    pub fn last_precision(&self) -> u32 {
        self.last_precision.load(Ordering::SeqCst)
    }

    /// Make the next optimize call fail.
    pub async fn set_next_error(&self, message: impl Into<String>) {
        *self.next_error.write().await = Some(message.into());
    }

    /// Make every optimize call fail.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Optimizer for MockOptimizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn optimize(
        &self,
        document: &[u8],
        path_precision: u32,
    ) -> Result<Vec<u8>, OptimizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_precision.store(path_precision, Ordering::SeqCst);

        if let Some(message) = self.next_error.write().await.take() {
            return Err(OptimizationError::Failed(message));
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(OptimizationError::Failed("optimizer disabled for test".to_string()));
        }

        let text = std::str::from_utf8(document)
            .map_err(|e| OptimizationError::Parse(e.to_string()))?;
        if !text.contains("<svg") {
            return Err(OptimizationError::Parse("no <svg> element".to_string()));
        }

        let stripped = COMMENT.replace_all(text, "");
        let compact = BETWEEN_TAGS.replace_all(stripped.trim(), "><");
        Ok(compact.into_owned().into_bytes())
    }
}
