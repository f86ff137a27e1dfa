//! In-memory video store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use vhub_models::{VideoId, VideoRecord, VideoStatus};

use crate::error::{StoreError, StoreResult};
use crate::store::VideoStore;

/// In-memory reference implementation of [`VideoStore`].
#[derive(Default)]
pub struct MemoryVideoStore {
    records: RwLock<HashMap<VideoId, VideoRecord>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, record: VideoRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.video_id) {
            return Err(StoreError::already_exists(record.video_id.as_str()));
        }
        debug!(video_id = %record.video_id, tenant = %record.tenant_id, "Created video record");
        records.insert(record.video_id.clone(), record);
        Ok(())
    }

    async fn update_status(
        &self,
        video_id: &VideoId,
        status: VideoStatus,
        progress: u8,
    ) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(video_id)
            .ok_or_else(|| StoreError::not_found(video_id.as_str()))?;

        let now = Utc::now();
        record.status = status;
        record.progress = progress.min(100);
        record.updated_at = now;
        match status {
            VideoStatus::Safe | VideoStatus::Flagged => {
                record.completed_at.get_or_insert(now);
            }
            VideoStatus::Failed => {
                record.failed_at.get_or_insert(now);
            }
            _ => {}
        }

        debug!(video_id = %video_id, status = %status, progress, "Updated video status");
        Ok(())
    }

    async fn set_error(&self, video_id: &VideoId, message: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(video_id)
            .ok_or_else(|| StoreError::not_found(video_id.as_str()))?;
        record.error_message = Some(message.to_string());
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, video_id: &VideoId) -> StoreResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(video_id).cloned())
    }

    async fn list_by_tenant(&self, tenant_id: &str) -> StoreResult<Vec<VideoRecord>> {
        let records = self.records.read().await;
        let mut videos: Vec<VideoRecord> = records
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn list_processing(
        &self,
        older_than: DateTime<Utc>,
    ) -> StoreResult<Vec<VideoRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == VideoStatus::Processing && r.updated_at < older_than)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(tenant: &str) -> VideoRecord {
        VideoRecord::new(
            VideoId::new(),
            tenant,
            "clip.mp4",
            "https://media.example/clip.mp4",
            "videohub/clip.mp4",
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryVideoStore::new();
        let rec = record("t1");
        let id = rec.video_id.clone();

        store.create(rec).await.unwrap();
        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.video_id, id);
        assert_eq!(fetched.status, VideoStatus::Processing);
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let store = MemoryVideoStore::new();
        let rec = record("t1");
        store.create(rec.clone()).await.unwrap();
        assert!(matches!(
            store.create(rec).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_status_idempotent() {
        let store = MemoryVideoStore::new();
        let rec = record("t1");
        let id = rec.video_id.clone();
        store.create(rec).await.unwrap();

        store
            .update_status(&id, VideoStatus::Safe, 100)
            .await
            .unwrap();
        let first = store.get(&id).await.unwrap().unwrap();

        store
            .update_status(&id, VideoStatus::Safe, 100)
            .await
            .unwrap();
        let second = store.get(&id).await.unwrap().unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.progress, second.progress);
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryVideoStore::new();
        let missing = VideoId::new();
        assert!(matches!(
            store.update_status(&missing, VideoStatus::Safe, 100).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_tenant_newest_first() {
        let store = MemoryVideoStore::new();
        let mut first = record("t1");
        first.created_at = Utc::now() - Duration::seconds(60);
        let second = record("t1");
        let other = record("t2");

        let first_id = first.video_id.clone();
        let second_id = second.video_id.clone();

        store.create(first).await.unwrap();
        store.create(second).await.unwrap();
        store.create(other).await.unwrap();

        let listed = store.list_by_tenant("t1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].video_id, second_id);
        assert_eq!(listed[1].video_id, first_id);
    }

    #[tokio::test]
    async fn test_list_processing_filters_by_age() {
        let store = MemoryVideoStore::new();
        let mut stale = record("t1");
        stale.updated_at = Utc::now() - Duration::seconds(600);
        let stale_id = stale.video_id.clone();
        let fresh = record("t1");
        let mut done = record("t1");
        done.updated_at = Utc::now() - Duration::seconds(600);
        done.status = VideoStatus::Safe;

        store.create(stale).await.unwrap();
        store.create(fresh).await.unwrap();
        store.create(done).await.unwrap();

        let cutoff = Utc::now() - Duration::seconds(300);
        let stuck = store.list_processing(cutoff).await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].video_id, stale_id);
    }
}
