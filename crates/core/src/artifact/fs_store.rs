//! Filesystem-backed artifact store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::metrics;

use super::error::StoreError;
use super::traits::ArtifactStore;
use super::types::{Artifact, ArtifactHandle, ArtifactKind, ArtifactMeta};

/// Stores each artifact as one file named by its handle.
///
/// Metadata lives in memory only; artifacts are ephemeral, so files left
/// behind by a previous process are removed when the store is opened.
///
/// Readers hold the index read lock while reading a file and the sweeper
/// takes the write lock before deleting, so a sweep never removes a file
/// that is being read.
pub struct FsArtifactStore {
    dir: PathBuf,
    retention: chrono::Duration,
    index: RwLock<HashMap<ArtifactHandle, ArtifactMeta>>,
}

impl FsArtifactStore {
    /// Opens (and clears) the artifact directory.
    pub async fn open(dir: impl Into<PathBuf>, retention: chrono::Duration) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let mut leftovers = 0usize;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                leftovers += 1;
            }
        }
        if leftovers > 0 {
            info!(dir = %dir.display(), count = leftovers, "Removed leftover artifacts");
        }

        Ok(Self {
            dir,
            retention,
            index: RwLock::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, handle: &ArtifactHandle) -> PathBuf {
        self.dir.join(handle.as_str())
    }

    async fn remove_file(&self, handle: &ArtifactHandle) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(handle)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put_named(
        &self,
        bytes: Vec<u8>,
        kind: ArtifactKind,
        original_name: Option<String>,
    ) -> Result<ArtifactHandle, StoreError> {
        let handle = ArtifactHandle::generate(kind.extension_for(&bytes));
        let path = self.path_for(&handle);
        let tmp_path = self.dir.join(format!(".{}.partial", handle));

        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(e));
        }

        let meta = ArtifactMeta::new(handle.clone(), kind, bytes.len() as u64, original_name);
        self.index.write().await.insert(handle.clone(), meta);

        metrics::ARTIFACTS_STORED
            .with_label_values(&[kind.as_str()])
            .inc();
        debug!(%handle, kind = kind.as_str(), size = bytes.len(), "Stored artifact");
        Ok(handle)
    }

    async fn get(&self, handle: &ArtifactHandle) -> Result<Artifact, StoreError> {
        let index = self.index.read().await;
        let meta = index
            .get(handle)
            .filter(|meta| !meta.is_expired(Utc::now(), self.retention))
            .ok_or_else(|| StoreError::NotFound(handle.to_string()))?;

        let bytes = match tokio::fs::read(self.path_for(handle)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%handle, "Artifact indexed but missing on disk");
                return Err(StoreError::NotFound(handle.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Artifact {
            meta: meta.clone(),
            bytes,
        })
    }

    async fn delete(&self, handle: &ArtifactHandle) -> Result<(), StoreError> {
        let mut index = self.index.write().await;
        if index.remove(handle).is_some() {
            debug!(%handle, "Deleted artifact");
        }
        self.remove_file(handle).await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut index = self.index.write().await;
        let expired: Vec<ArtifactHandle> = index
            .values()
            .filter(|meta| meta.is_expired(now, self.retention))
            .map(|meta| meta.handle.clone())
            .collect();

        for handle in &expired {
            index.remove(handle);
            if let Err(e) = self.remove_file(handle).await {
                warn!(%handle, error = %e, "Failed to remove expired artifact file");
            }
        }

        if !expired.is_empty() {
            metrics::ARTIFACTS_SWEPT.inc_by(expired.len() as u64);
            info!(count = expired.len(), "Swept expired artifacts");
        }
        Ok(expired.len())
    }

    async fn len(&self) -> usize {
        self.index.read().await.len()
    }
}
