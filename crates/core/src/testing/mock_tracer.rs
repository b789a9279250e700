//! Mock tracer for testing.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::params::ParameterSet;
use crate::tracer::{inspect_image, Tracer, TracingError};

/// A recorded trace call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTrace {
    /// SHA-256 of the input bytes, hex encoded.
    pub input_digest: String,
    pub params: ParameterSet,
}

/// Mock implementation of the Tracer trait.
///
/// Produces a small deterministic SVG whose content depends on the input
/// bytes and the parameters. The document is indented and commented so that
/// an optimizer has something to remove. Inputs that are not decodable
/// images fail the same way the real engine does.
///
/// # Example
///
/// ```rust,ignore
/// let tracer = MockTracer::new();
/// tracer.set_delay_for(&slow_image, Duration::from_millis(200)).await;
/// tracer.set_next_error(TracingError::engine_failed("boom")).await;
/// ```
#[derive(Debug, Default)]
pub struct MockTracer {
    calls: Arc<RwLock<Vec<RecordedTrace>>>,
    next_error: Arc<RwLock<Option<TracingError>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn digest_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl MockTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded trace calls.
    pub async fn recorded_traces(&self) -> Vec<RecordedTrace> {
        self.calls.read().await.clone()
    }

    /// Get the number of trace calls.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Make the next trace call fail with `error`.
    pub async fn set_next_error(&self, error: TracingError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every trace of exactly these bytes.
    pub async fn set_delay_for(&self, image: &[u8], delay: Duration) {
        self.delays.write().await.insert(digest_hex(image), delay);
    }

    /// Highest number of traces that ran at the same time.
    pub async fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn render(digest: &str, width: u32, height: u32, params: &ParameterSet) -> Vec<u8> {
        let fill = &digest[..6];
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        svg.push_str(&format!(
            "<!-- mock trace: colormode={} mode={} hierarchical={} -->\n",
            params.color_mode(),
            params.curve_mode(),
            params.hierarchical()
        ));
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\">\n",
            w = width,
            h = height
        ));
        // more layers for finer color precision, like a real trace
        let layers = u32::from(params.color_precision()).max(1);
        for layer in 0..layers {
            let inset = layer.min(width.min(height) / 2);
            svg.push_str(&format!(
                "    <path d=\"M{x0} {y0} L{x1} {y0} L{x1} {y1} L{x0} {y1} Z\" fill=\"#{fill}\" opacity=\"{o:.precision$}\" />\n",
                x0 = inset,
                y0 = inset,
                x1 = width - inset,
                y1 = height - inset,
                fill = fill,
                o = 1.0 / f64::from(layer + 1),
                precision = params.path_precision() as usize,
            ));
        }
        svg.push_str("</svg>\n");
        svg.into_bytes()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Tracer for MockTracer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn trace(&self, image: &[u8], params: &ParameterSet) -> Result<Vec<u8>, TracingError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let digest = digest_hex(image);
        self.calls.write().await.push(RecordedTrace {
            input_digest: digest.clone(),
            params: params.clone(),
        });

        let delay = self.delays.read().await.get(&digest).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let info = inspect_image(image)?;
        Ok(Self::render(&digest, info.width, info.height, params))
    }
}
