//! Pluggable processing step.
//!
//! The `Processor` trait is the seam between the pipeline and whatever the
//! actual work is: a real transcoding/moderation implementation can be
//! substituted without touching queue or notification logic.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use vhub_models::{ModerationJob, VideoStatus};

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processing failed: {0}")]
    Failed(String),

    #[error("Processing timed out after {0:?}")]
    Timeout(Duration),
}

impl ProcessorError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Final state a successful processing run resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Terminal status (`Safe` or `Flagged`; failures use the error path)
    pub status: VideoStatus,
    /// Final progress, 100 for completed runs
    pub progress: u8,
}

impl ProcessOutcome {
    pub fn safe() -> Self {
        Self {
            status: VideoStatus::Safe,
            progress: 100,
        }
    }

    pub fn flagged() -> Self {
        Self {
            status: VideoStatus::Flagged,
            progress: 100,
        }
    }
}

/// A single processing step over one claimed job.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Process the job's video, resolving to a final `{status, progress}`
    /// or an error. Implementations should bound their own runtime; the
    /// executor has no way to abort an in-flight step.
    async fn process(&self, job: &ModerationJob) -> ProcessorResult<ProcessOutcome>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// The stubbed step: every video resolves to `safe` at full progress.
pub struct MarkSafeProcessor;

#[async_trait]
impl Processor for MarkSafeProcessor {
    async fn process(&self, _job: &ModerationJob) -> ProcessorResult<ProcessOutcome> {
        Ok(ProcessOutcome::safe())
    }

    fn name(&self) -> &'static str {
        "mark_safe"
    }
}

/// Decorator that bounds the inner step's runtime, resolving to a timeout
/// error rather than hanging the worker.
pub struct TimeoutProcessor<P> {
    inner: P,
    timeout: Duration,
}

impl<P> TimeoutProcessor<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<P: Processor> Processor for TimeoutProcessor<P> {
    async fn process(&self, job: &ModerationJob) -> ProcessorResult<ProcessOutcome> {
        match tokio::time::timeout(self.timeout, self.inner.process(job)).await {
            Ok(result) => result,
            Err(_) => Err(ProcessorError::Timeout(self.timeout)),
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vhub_models::VideoId;

    struct HangingProcessor;

    #[async_trait]
    impl Processor for HangingProcessor {
        async fn process(&self, _job: &ModerationJob) -> ProcessorResult<ProcessOutcome> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ProcessOutcome::safe())
        }

        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_mark_safe() {
        let job = ModerationJob::new(VideoId::new(), "t1");
        let outcome = MarkSafeProcessor.process(&job).await.unwrap();
        assert_eq!(outcome.status, VideoStatus::Safe);
        assert_eq!(outcome.progress, 100);
    }

    #[tokio::test]
    async fn test_timeout_converts_hang_to_error() {
        let job = ModerationJob::new(VideoId::new(), "t1");
        let processor = TimeoutProcessor::new(HangingProcessor, Duration::from_millis(50));

        let result = processor.process(&job).await;
        assert!(matches!(result, Err(ProcessorError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_timeout_passes_fast_result_through() {
        let job = ModerationJob::new(VideoId::new(), "t1");
        let processor = TimeoutProcessor::new(MarkSafeProcessor, Duration::from_secs(5));

        let outcome = processor.process(&job).await.unwrap();
        assert_eq!(outcome.status, VideoStatus::Safe);
    }
}
