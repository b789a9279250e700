//! Remote image retrieval.

mod error;
mod http;
mod traits;

pub use error::FetchError;
pub use http::HttpFetcher;
pub use traits::{FetchedImage, Fetcher};
