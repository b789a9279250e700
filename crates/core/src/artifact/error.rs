//! Error types for artifact storage.

use thiserror::Error;

/// Errors returned by an [`ArtifactStore`](super::ArtifactStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Handle is unknown, deleted, or past its retention window.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Handle does not have the shape of a generated handle.
    #[error("invalid artifact handle: {0:?}")]
    InvalidHandle(String),

    /// Backing storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the caller should treat this as a missing artifact.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidHandle(_))
    }
}
