//! Job executor.

use std::sync::Arc;

use metrics::counter;
use tracing::{error, info, warn};

use vhub_models::{ModerationJob, StatusEvent, VideoStatus};
use vhub_notify::NotificationBus;
use vhub_queue::JobConsumer;
use vhub_store::VideoStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::processor::Processor;

const JOBS_COMPLETED: &str = "vhub_jobs_completed_total";
const JOBS_FAILED: &str = "vhub_jobs_failed_total";

/// Executes moderation jobs with a pool of worker tasks.
///
/// Each claimed job reaches a terminal, observable state exactly once:
/// success and failure paths both persist the transition and publish a
/// status event, and nothing escalates out of a worker task.
pub struct JobExecutor {
    config: WorkerConfig,
    consumer: JobConsumer,
    store: Arc<dyn VideoStore>,
    bus: Arc<NotificationBus>,
    processor: Arc<dyn Processor>,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(
        config: WorkerConfig,
        consumer: JobConsumer,
        store: Arc<dyn VideoStore>,
        bus: Arc<NotificationBus>,
        processor: Arc<dyn Processor>,
    ) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);

        Self {
            config,
            consumer,
            store,
            bus,
            processor,
            shutdown,
        }
    }

    /// Run the worker pool until the queue closes or shutdown is signalled.
    ///
    /// In-flight jobs finish before their worker exits.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor with {} workers ({} processor)",
            self.config.concurrency,
            self.processor.name()
        );

        let mut handles = Vec::with_capacity(self.config.concurrency);

        for worker_id in 0..self.config.concurrency {
            let consumer = self.consumer.clone();
            let store = Arc::clone(&self.store);
            let bus = Arc::clone(&self.bus);
            let processor = Arc::clone(&self.processor);
            let mut shutdown_rx = self.shutdown.subscribe();

            handles.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!("Worker {} stopping on shutdown signal", worker_id);
                                break;
                            }
                        }
                        job = consumer.dequeue() => {
                            match job {
                                Some(job) => {
                                    Self::execute_job(&store, &bus, &processor, job).await;
                                }
                                None => {
                                    info!("Worker {} stopping: queue closed", worker_id);
                                    break;
                                }
                            }
                        }
                    }
                }
            }));
        }

        for handle in handles {
            handle.await.ok();
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Execute a single claimed job through to a terminal state.
    async fn execute_job(
        store: &Arc<dyn VideoStore>,
        bus: &Arc<NotificationBus>,
        processor: &Arc<dyn Processor>,
        job: ModerationJob,
    ) {
        info!(job_id = %job.job_id, video_id = %job.video_id, "Executing job");

        // Touch the record so the stale sweeper sees a live job, and tell
        // connected clients processing has started.
        let progress = Self::current_progress(store, &job).await;
        if let Err(e) = store
            .update_status(&job.video_id, VideoStatus::Processing, progress)
            .await
        {
            warn!(video_id = %job.video_id, "Failed to mark record as processing: {}", e);
        }
        bus.publish(
            &job.tenant_id,
            StatusEvent::new(
                job.video_id.clone(),
                &job.tenant_id,
                VideoStatus::Processing,
                progress,
            ),
        )
        .await;

        match processor.process(&job).await {
            Ok(outcome) => {
                // Persist first, then notify; both are attempted even if the
                // store write fails, since the update is a keyed overwrite and
                // clients re-fetch on reconnect anyway.
                if let Err(e) = store
                    .update_status(&job.video_id, outcome.status, outcome.progress)
                    .await
                {
                    error!(
                        job_id = %job.job_id,
                        video_id = %job.video_id,
                        "Failed to persist terminal status: {}", e
                    );
                }

                bus.publish(
                    &job.tenant_id,
                    StatusEvent::new(
                        job.video_id.clone(),
                        &job.tenant_id,
                        outcome.status,
                        outcome.progress,
                    ),
                )
                .await;

                counter!(JOBS_COMPLETED).increment(1);
                info!(
                    job_id = %job.job_id,
                    video_id = %job.video_id,
                    status = %outcome.status,
                    "Job completed"
                );
            }
            Err(e) => {
                warn!(job_id = %job.job_id, video_id = %job.video_id, "Job failed: {}", e);

                // Failure keeps the last progress the job reported; the record
                // must never be left in `processing`.
                let progress = Self::current_progress(store, &job).await;
                if let Err(err) = store
                    .update_status(&job.video_id, VideoStatus::Failed, progress)
                    .await
                {
                    error!(
                        job_id = %job.job_id,
                        video_id = %job.video_id,
                        "Failed to persist failed status: {}", err
                    );
                }
                if let Err(err) = store.set_error(&job.video_id, &e.to_string()).await {
                    warn!(video_id = %job.video_id, "Failed to record error message: {}", err);
                }

                bus.publish(
                    &job.tenant_id,
                    StatusEvent::new(
                        job.video_id.clone(),
                        &job.tenant_id,
                        VideoStatus::Failed,
                        progress,
                    ),
                )
                .await;

                counter!(JOBS_FAILED).increment(1);
            }
        }
    }

    async fn current_progress(store: &Arc<dyn VideoStore>, job: &ModerationJob) -> u8 {
        store
            .get(&job.video_id)
            .await
            .ok()
            .flatten()
            .map(|record| record.progress)
            .unwrap_or(0)
    }
}
