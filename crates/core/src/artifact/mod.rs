//! Artifact storage for uploaded sources and generated outputs.
//!
//! The store is the only component that creates or removes artifacts; every
//! other component refers to them through an [`ArtifactHandle`].
//!
//! # Example
//!
//! ```ignore
//! use tracery_core::artifact::{ArtifactKind, ArtifactStore, FsArtifactStore};
//!
//! let store = FsArtifactStore::open("./artifacts", chrono::Duration::hours(1)).await?;
//! let handle = store.put(svg_bytes, ArtifactKind::GeneratedSvg).await?;
//! let artifact = store.get(&handle).await?;
//!
//! // Called periodically by the server
//! store.sweep_expired(chrono::Utc::now()).await?;
//! ```

mod error;
mod fs_store;
mod memory_store;
mod traits;
mod types;

pub use error::StoreError;
pub use fs_store::FsArtifactStore;
pub use memory_store::MemoryArtifactStore;
pub use traits::ArtifactStore;
pub use types::{content_type_for, Artifact, ArtifactHandle, ArtifactKind, ArtifactMeta};
