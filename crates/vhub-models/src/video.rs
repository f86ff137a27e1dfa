//! Video metadata models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video lifecycle status.
///
/// `Safe`, `Flagged` and `Failed` are terminal: no further automatic
/// transition occurs once one of them is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Binary stored, no job claimed yet
    #[default]
    Uploaded,
    /// A moderation job is pending or running
    Processing,
    /// Moderation passed
    Safe,
    /// Moderation flagged the content
    Flagged,
    /// Processing failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Safe => "safe",
            VideoStatus::Flagged => "flagged",
            VideoStatus::Failed => "failed",
        }
    }

    /// True once no further automatic transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VideoStatus::Safe | VideoStatus::Flagged | VideoStatus::Failed
        )
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video record persisted in the resource state store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Unique video ID
    pub video_id: VideoId,

    /// Owning tenant (account/user)
    pub tenant_id: String,

    /// Original filename as uploaded
    pub filename: String,

    /// Retrievable locator for the stored binary
    pub media_url: String,

    /// Object store key for the stored binary
    pub object_key: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: VideoStatus,

    /// Progress 0-100; 100 for successful terminal states
    #[serde(default)]
    pub progress: u8,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Failure timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VideoRecord {
    /// Create a new record at submission time.
    ///
    /// The record starts in `Processing` with zero progress: submission
    /// enqueues the moderation job immediately after creating it.
    pub fn new(
        video_id: VideoId,
        tenant_id: impl Into<String>,
        filename: impl Into<String>,
        media_url: impl Into<String>,
        object_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            video_id,
            tenant_id: tenant_id.into(),
            filename: filename.into(),
            media_url: media_url.into(),
            object_key: object_key.into(),
            status: VideoStatus::Processing,
            progress: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
            error_message: None,
        }
    }

    /// Mark as successfully completed with a terminal status.
    pub fn complete(mut self, status: VideoStatus) -> Self {
        debug_assert!(status.is_terminal() && status != VideoStatus::Failed);
        self.status = status;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Mark as failed. Progress keeps the last value the job reported.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = VideoStatus::Failed;
        self.failed_at = Some(Utc::now());
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_creation() {
        let id = VideoId::new();
        let record = VideoRecord::new(
            id.clone(),
            "tenant-1",
            "clip.mp4",
            "https://media.example/clip.mp4",
            "videohub/tenant-1/clip.mp4",
        );

        assert_eq!(record.video_id, id);
        assert_eq!(record.status, VideoStatus::Processing);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!VideoStatus::Uploaded.is_terminal());
        assert!(!VideoStatus::Processing.is_terminal());
        assert!(VideoStatus::Safe.is_terminal());
        assert!(VideoStatus::Flagged.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
    }

    #[test]
    fn test_complete_sets_full_progress() {
        let record = VideoRecord::new(VideoId::new(), "t", "f.mp4", "u", "k");
        let done = record.complete(VideoStatus::Safe);
        assert_eq!(done.status, VideoStatus::Safe);
        assert_eq!(done.progress, 100);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_fail_keeps_progress() {
        let mut record = VideoRecord::new(VideoId::new(), "t", "f.mp4", "u", "k");
        record.progress = 40;
        let failed = record.fail("boom");
        assert_eq!(failed.status, VideoStatus::Failed);
        assert_eq!(failed.progress, 40);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
    }
}
