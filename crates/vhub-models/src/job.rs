//! Moderation job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::VideoId;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
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

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of deferred work against one uploaded video.
///
/// Immutable once enqueued; the queue owns it until a worker claims it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModerationJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Video to process
    pub video_id: VideoId,

    /// Owning tenant, used as the notification routing key
    pub tenant_id: String,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl ModerationJob {
    /// Create a new job for a video owned by `tenant_id`.
    pub fn new(video_id: VideoId, tenant_id: impl Into<String>) -> Self {
        Self {
            job_id: JobId::new(),
            video_id,
            tenant_id: tenant_id.into(),
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let video_id = VideoId::new();
        let job = ModerationJob::new(video_id.clone(), "tenant-1");

        assert_eq!(job.video_id, video_id);
        assert_eq!(job.tenant_id, "tenant-1");
        assert_ne!(job.job_id, ModerationJob::new(video_id, "tenant-1").job_id);
    }
}
