//! Moderation worker.
//!
//! This crate provides:
//! - The pluggable `Processor` contract and its stock implementations
//! - `JobExecutor`: a pool of tasks draining the job queue
//! - Status persistence + notification on every terminal transition
//! - Stale-resource recovery for jobs whose worker died mid-flight

pub mod config;
pub mod error;
pub mod executor;
pub mod processor;
pub mod sweeper;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use processor::{
    MarkSafeProcessor, ProcessOutcome, Processor, ProcessorError, ProcessorResult,
    TimeoutProcessor,
};
pub use sweeper::{StaleResourceSweeper, SweeperConfig};
