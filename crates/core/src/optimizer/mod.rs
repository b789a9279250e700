//! SVG optimization.

mod error;
mod traits;
mod usvg_optimizer;

pub use error::OptimizationError;
pub use traits::Optimizer;
pub use usvg_optimizer::UsvgOptimizer;
