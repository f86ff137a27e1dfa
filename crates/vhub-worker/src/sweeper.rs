//! Background recovery for resources stuck in `processing`.
//!
//! A worker that dies mid-flight leaves its record non-terminal with no
//! one left to finish it. The sweeper periodically force-fails any record
//! whose last update is older than the stale threshold and notifies the
//! tenant's connections, so clients never wait forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use vhub_models::{StatusEvent, VideoStatus};
use vhub_notify::NotificationBus;
use vhub_store::{StoreResult, VideoStore};

/// Message persisted on records the sweeper recovers.
const STALE_ERROR: &str = "Processing timed out. The worker may have crashed. Please upload again.";

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Master switch
    pub enabled: bool,
    /// Time between sweeps
    pub interval: Duration,
    /// Age after which a `processing` record counts as stuck
    pub stale_threshold: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            stale_threshold: Duration::from_secs(900), // 15 minutes
        }
    }
}

impl SweeperConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SWEEP_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            stale_threshold: Duration::from_secs(
                std::env::var("SWEEP_STALE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
        }
    }
}

/// Stale resource sweeper.
pub struct StaleResourceSweeper {
    store: Arc<dyn VideoStore>,
    bus: Arc<NotificationBus>,
    config: SweeperConfig,
}

impl StaleResourceSweeper {
    pub fn new(
        store: Arc<dyn VideoStore>,
        bus: Arc<NotificationBus>,
        config: SweeperConfig,
    ) -> Self {
        Self { store, bus, config }
    }

    /// Run the sweep loop indefinitely. Spawn as a background task.
    pub async fn run(&self) {
        if !self.config.enabled {
            info!("Stale resource sweeping is disabled");
            return;
        }

        info!(
            "Starting stale resource sweeper (interval {:?}, threshold {:?})",
            self.config.interval, self.config.stale_threshold
        );

        let mut ticker = interval(self.config.interval);

        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok(recovered) if recovered > 0 => {
                    info!("Recovered {} stale resources", recovered);
                }
                Ok(_) => {}
                Err(e) => error!("Stale resource sweep failed: {}", e),
            }
        }
    }

    /// Run a single sweep. Returns how many records were recovered.
    pub async fn check_once(&self) -> StoreResult<u32> {
        let threshold = chrono::Duration::from_std(self.config.stale_threshold)
            .unwrap_or_else(|_| chrono::Duration::seconds(900));
        let cutoff = chrono::Utc::now() - threshold;

        let stuck = self.store.list_processing(cutoff).await?;
        let mut recovered = 0u32;

        for record in stuck {
            warn!(
                video_id = %record.video_id,
                tenant = %record.tenant_id,
                updated_at = %record.updated_at,
                "Detected stale resource, marking as failed"
            );

            if let Err(e) = self
                .store
                .update_status(&record.video_id, VideoStatus::Failed, record.progress)
                .await
            {
                error!(video_id = %record.video_id, "Failed to recover stale resource: {}", e);
                continue;
            }
            if let Err(e) = self.store.set_error(&record.video_id, STALE_ERROR).await {
                warn!(video_id = %record.video_id, "Failed to record stale error: {}", e);
            }

            self.bus
                .publish(
                    &record.tenant_id,
                    StatusEvent::new(
                        record.video_id.clone(),
                        &record.tenant_id,
                        VideoStatus::Failed,
                        record.progress,
                    ),
                )
                .await;

            recovered += 1;
        }

        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::mpsc;
    use vhub_models::{VideoId, VideoRecord};
    use vhub_notify::{ConnectionId, TenantRegistry};
    use vhub_store::MemoryVideoStore;

    fn sweeper(
        store: Arc<MemoryVideoStore>,
        registry: Arc<TenantRegistry>,
    ) -> StaleResourceSweeper {
        StaleResourceSweeper::new(
            store as Arc<dyn VideoStore>,
            Arc::new(NotificationBus::new(registry)),
            SweeperConfig {
                stale_threshold: Duration::from_secs(300),
                ..SweeperConfig::default()
            },
        )
    }

    fn record(tenant: &str) -> VideoRecord {
        VideoRecord::new(VideoId::new(), tenant, "a.mp4", "url", "key")
    }

    #[tokio::test]
    async fn test_stale_record_recovered_and_published() {
        let store = Arc::new(MemoryVideoStore::new());
        let registry = Arc::new(TenantRegistry::new());

        let (tx, mut rx) = mpsc::channel(8);
        registry.join("t1", ConnectionId::new(), tx).await;

        let mut stuck = record("t1");
        stuck.progress = 60;
        stuck.updated_at = Utc::now() - chrono::Duration::seconds(600);
        let stuck_id = stuck.video_id.clone();
        store.create(stuck).await.unwrap();

        let recovered = sweeper(Arc::clone(&store), registry).check_once().await.unwrap();
        assert_eq!(recovered, 1);

        let stored = store.get(&stuck_id).await.unwrap().unwrap();
        assert_eq!(stored.status, VideoStatus::Failed);
        assert_eq!(stored.progress, 60);
        assert!(stored.error_message.is_some());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.video_id, stuck_id);
        assert_eq!(event.status, VideoStatus::Failed);
        assert_eq!(event.progress, 60);
    }

    #[tokio::test]
    async fn test_fresh_records_left_alone() {
        let store = Arc::new(MemoryVideoStore::new());
        let registry = Arc::new(TenantRegistry::new());

        let fresh = record("t1");
        let fresh_id = fresh.video_id.clone();
        store.create(fresh).await.unwrap();

        let recovered = sweeper(Arc::clone(&store), registry).check_once().await.unwrap();
        assert_eq!(recovered, 0);

        let stored = store.get(&fresh_id).await.unwrap().unwrap();
        assert_eq!(stored.status, VideoStatus::Processing);
    }
}
