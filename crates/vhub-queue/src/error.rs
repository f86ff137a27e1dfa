//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is full")]
    Full,

    #[error("Queue is closed")]
    Closed,
}

impl QueueError {
    /// True when the caller should back off and retry later.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, QueueError::Full)
    }
}
