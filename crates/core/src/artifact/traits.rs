//! Trait definition for artifact storage backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::types::{Artifact, ArtifactHandle, ArtifactKind};

/// Sole owner of stored source images and generated outputs.
///
/// Implementations must allow concurrent `put`/`get` calls. A handle that has
/// been deleted or has outlived the retention window resolves to
/// [`StoreError::NotFound`] forever after; handles are never reused.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores bytes under a fresh handle, remembering the client-facing name.
    async fn put_named(
        &self,
        bytes: Vec<u8>,
        kind: ArtifactKind,
        original_name: Option<String>,
    ) -> Result<ArtifactHandle, StoreError>;

    /// Stores bytes under a fresh handle.
    async fn put(&self, bytes: Vec<u8>, kind: ArtifactKind) -> Result<ArtifactHandle, StoreError> {
        self.put_named(bytes, kind, None).await
    }

    /// Reads an artifact. Expired artifacts are reported as not found even
    /// before the next sweep removes them.
    async fn get(&self, handle: &ArtifactHandle) -> Result<Artifact, StoreError>;

    /// Removes an artifact. Deleting an absent handle is not an error.
    async fn delete(&self, handle: &ArtifactHandle) -> Result<(), StoreError>;

    /// Removes every artifact older than the retention window at `now`.
    /// Returns the number of artifacts removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Number of artifacts currently held, expired or not.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
