//! In-process job queue.
//!
//! This crate provides:
//! - FIFO job submission decoupled from execution
//! - An optional capacity bound with synchronous backpressure
//! - Slot reservation so submitters can fail before side effects
//! - A shared consumer that hands each job to exactly one worker

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{channel, EnqueuePermit, JobConsumer, JobQueue, QueueConfig};
