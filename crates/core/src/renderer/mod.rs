//! SVG to PNG rasterization.

mod error;
mod rsvg;
mod traits;

pub use error::RenderError;
pub use rsvg::RsvgRenderer;
pub use traits::Renderer;
