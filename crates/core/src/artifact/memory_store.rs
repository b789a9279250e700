//! In-memory artifact store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::metrics;

use super::error::StoreError;
use super::traits::ArtifactStore;
use super::types::{Artifact, ArtifactHandle, ArtifactKind, ArtifactMeta};

/// Keeps artifacts in process memory.
///
/// Used by the command-line tool, where outputs only need to live until they
/// are written to their destination, and by tests.
pub struct MemoryArtifactStore {
    retention: chrono::Duration,
    artifacts: RwLock<HashMap<ArtifactHandle, Artifact>>,
}

impl MemoryArtifactStore {
    pub fn new(retention: chrono::Duration) -> Self {
        Self {
            retention,
            artifacts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new(chrono::Duration::hours(1))
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put_named(
        &self,
        bytes: Vec<u8>,
        kind: ArtifactKind,
        original_name: Option<String>,
    ) -> Result<ArtifactHandle, StoreError> {
        let handle = ArtifactHandle::generate(kind.extension_for(&bytes));
        let meta = ArtifactMeta::new(handle.clone(), kind, bytes.len() as u64, original_name);
        self.artifacts
            .write()
            .await
            .insert(handle.clone(), Artifact { meta, bytes });

        metrics::ARTIFACTS_STORED
            .with_label_values(&[kind.as_str()])
            .inc();
        Ok(handle)
    }

    async fn get(&self, handle: &ArtifactHandle) -> Result<Artifact, StoreError> {
        self.artifacts
            .read()
            .await
            .get(handle)
            .filter(|artifact| !artifact.meta.is_expired(Utc::now(), self.retention))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(handle.to_string()))
    }

    async fn delete(&self, handle: &ArtifactHandle) -> Result<(), StoreError> {
        self.artifacts.write().await.remove(handle);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut artifacts = self.artifacts.write().await;
        let before = artifacts.len();
        artifacts.retain(|_, artifact| !artifact.meta.is_expired(now, self.retention));
        let removed = before - artifacts.len();

        if removed > 0 {
            metrics::ARTIFACTS_SWEPT.inc_by(removed as u64);
            debug!(count = removed, "Swept expired in-memory artifacts");
        }
        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }
}
