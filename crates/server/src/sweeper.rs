//! Periodic removal of expired artifacts.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tracery_core::ArtifactStore;

/// Calls [`ArtifactStore::sweep_expired`] on a fixed interval until shut down.
pub struct Sweeper {
    store: Arc<dyn ArtifactStore>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(store: Arc<dyn ArtifactStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs one sweep. Storage errors are logged, not returned.
    pub async fn sweep_once(&self) -> usize {
        match self.store.sweep_expired(Utc::now()).await {
            Ok(removed) => {
                debug!(removed, "Artifact sweep finished");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Artifact sweep failed");
                0
            }
        }
    }

    /// Sweeps every interval until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Artifact sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Artifact sweeper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracery_core::{ArtifactKind, MemoryArtifactStore};

    fn short_lived_store() -> Arc<dyn ArtifactStore> {
        Arc::new(MemoryArtifactStore::new(chrono::Duration::milliseconds(50)))
    }

    #[tokio::test]
    async fn test_sweep_once_removes_expired() {
        let store = short_lived_store();
        store.put(b"<svg/>".to_vec(), ArtifactKind::GeneratedSvg).await.unwrap();
        let sweeper = Sweeper::new(Arc::clone(&store), Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await, 0);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(sweeper.sweep_once().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_background_sweeper_runs_and_stops() {
        let store = short_lived_store();
        store.put(b"<svg/>".to_vec(), ArtifactKind::GeneratedSvg).await.unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = Sweeper::new(Arc::clone(&store), Duration::from_millis(30)).spawn(rx);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.is_empty().await);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper stops on shutdown")
            .unwrap();
    }
}
