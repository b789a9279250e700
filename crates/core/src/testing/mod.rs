//! Testing utilities and mock implementations.
//!
//! Mocks for every engine trait, so the job pipeline, the service and the
//! HTTP API can be exercised without `vtracer`, `rsvg-convert` or network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tracery_core::testing::{fixtures, MockFetcher, MockOptimizer, MockRenderer, MockTracer};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.add_image("https://example.com/cat.png", fixtures::solid_png(8, 8, [0, 0, 0])).await;
//!
//! let optimizer = MockOptimizer::new();
//! optimizer.set_next_error("boom").await;
//! ```

mod mock_fetcher;
mod mock_optimizer;
mod mock_renderer;
mod mock_tracer;

pub use mock_fetcher::MockFetcher;
pub use mock_optimizer::MockOptimizer;
pub use mock_renderer::MockRenderer;
pub use mock_tracer::{MockTracer, RecordedTrace};

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("in-memory image encoding");
        bytes
    }

    /// A PNG filled with one color.
    pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        encode(&RgbImage::from_pixel(width, height, Rgb(color)), ImageFormat::Png)
    }

    /// A PNG split vertically into two colors.
    pub fn two_tone_png(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb(left)
            } else {
                Rgb(right)
            }
        });
        encode(&image, ImageFormat::Png)
    }

    /// A JPEG filled with one color.
    pub fn solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        encode(&RgbImage::from_pixel(width, height, Rgb(color)), ImageFormat::Jpeg)
    }

    /// A PNG cut off after its signature and part of the header.
    pub fn truncated_png() -> Vec<u8> {
        let mut bytes = solid_png(16, 16, [128, 128, 128]);
        bytes.truncate(20);
        bytes
    }

    /// Bytes that are not an image at all.
    pub fn not_an_image() -> Vec<u8> {
        b"%PDF-1.4 definitely not a raster image".to_vec()
    }
}
