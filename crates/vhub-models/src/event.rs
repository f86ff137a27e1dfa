//! Status events delivered through the notification bus.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{VideoId, VideoRecord, VideoStatus};

/// A single status transition for one video, routed to the owning tenant's
/// live connections. Ephemeral: constructed fresh at publish time, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusEvent {
    /// Video the transition belongs to
    pub video_id: VideoId,

    /// Owning tenant (routing key)
    pub tenant_id: String,

    /// New status
    pub status: VideoStatus,

    /// Progress 0-100
    pub progress: u8,
}

impl StatusEvent {
    /// Build an event from explicit fields.
    pub fn new(
        video_id: VideoId,
        tenant_id: impl Into<String>,
        status: VideoStatus,
        progress: u8,
    ) -> Self {
        Self {
            video_id,
            tenant_id: tenant_id.into(),
            status,
            progress: progress.min(100),
        }
    }

    /// Snapshot the current state of a record.
    pub fn for_record(record: &VideoRecord) -> Self {
        Self {
            video_id: record.video_id.clone(),
            tenant_id: record.tenant_id.clone(),
            status: record.status,
            progress: record.progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamped() {
        let event = StatusEvent::new(VideoId::new(), "t1", VideoStatus::Processing, 250);
        assert_eq!(event.progress, 100);
    }

    #[test]
    fn test_for_record_snapshots_state() {
        let record = VideoRecord::new(VideoId::new(), "t1", "a.mp4", "url", "key")
            .complete(VideoStatus::Safe);
        let event = StatusEvent::for_record(&record);
        assert_eq!(event.status, VideoStatus::Safe);
        assert_eq!(event.progress, 100);
        assert_eq!(event.tenant_id, "t1");
    }
}
