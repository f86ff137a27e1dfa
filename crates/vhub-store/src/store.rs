//! The resource state store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vhub_models::{VideoId, VideoRecord, VideoStatus};

use crate::error::StoreResult;

/// Durable record store for video lifecycle state.
///
/// The executor is the only writer for a record while its job runs; the
/// rest of the application reads. `update_status` is a keyed overwrite, so
/// re-applying the same terminal state is safe.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Persist a new record. Fails if the ID is already taken.
    async fn create(&self, record: VideoRecord) -> StoreResult<()>;

    /// Overwrite status and progress for a record.
    ///
    /// Terminal success states also stamp `completed_at`; `Failed` stamps
    /// `failed_at`. Idempotent per (id, status, progress).
    async fn update_status(
        &self,
        video_id: &VideoId,
        status: VideoStatus,
        progress: u8,
    ) -> StoreResult<()>;

    /// Attach an error message to a record.
    async fn set_error(&self, video_id: &VideoId, message: &str) -> StoreResult<()>;

    /// Fetch a record by ID.
    async fn get(&self, video_id: &VideoId) -> StoreResult<Option<VideoRecord>>;

    /// All records owned by a tenant, newest first.
    async fn list_by_tenant(&self, tenant_id: &str) -> StoreResult<Vec<VideoRecord>>;

    /// Records still in `Processing` whose last update is older than the
    /// given instant. This is the recovery read path for stuck jobs.
    async fn list_processing(
        &self,
        older_than: DateTime<Utc>,
    ) -> StoreResult<Vec<VideoRecord>>;
}
