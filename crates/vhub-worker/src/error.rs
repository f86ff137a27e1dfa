//! Worker error types.

use thiserror::Error;

use crate::processor::ProcessorError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Processing failed: {0}")]
    Processor(#[from] ProcessorError),

    #[error("Store error: {0}")]
    Store(#[from] vhub_store::StoreError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
