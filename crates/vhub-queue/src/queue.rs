//! FIFO job queue backed by an in-process channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use vhub_models::ModerationJob;

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    /// Maximum queued jobs. `None` means unbounded.
    pub capacity: Option<usize>,
}

impl QueueConfig {
    /// Create config from environment variables.
    ///
    /// `QUEUE_CAPACITY` unset or `0` selects the unbounded variant.
    pub fn from_env() -> Self {
        Self {
            capacity: std::env::var("QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&n| n > 0),
        }
    }

    /// Bounded queue with the given capacity.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}

/// Create a connected queue/consumer pair.
pub fn channel(config: QueueConfig) -> (JobQueue, JobConsumer) {
    let depth = Arc::new(AtomicUsize::new(0));

    let (tx, rx) = match config.capacity {
        Some(capacity) => {
            info!("Job queue created (bounded, capacity {})", capacity);
            let (tx, rx) = mpsc::channel(capacity);
            (SenderKind::Bounded(tx), ReceiverKind::Bounded(rx))
        }
        None => {
            info!("Job queue created (unbounded)");
            let (tx, rx) = mpsc::unbounded_channel();
            (SenderKind::Unbounded(tx), ReceiverKind::Unbounded(rx))
        }
    };

    let queue = JobQueue {
        tx,
        depth: Arc::clone(&depth),
    };
    let consumer = JobConsumer {
        rx: Arc::new(Mutex::new(rx)),
        depth,
    };

    (queue, consumer)
}

#[derive(Clone)]
enum SenderKind {
    Bounded(mpsc::Sender<ModerationJob>),
    Unbounded(mpsc::UnboundedSender<ModerationJob>),
}

enum ReceiverKind {
    Bounded(mpsc::Receiver<ModerationJob>),
    Unbounded(mpsc::UnboundedReceiver<ModerationJob>),
}

/// Submission handle. Cheap to clone; enqueueing never waits on job
/// execution.
#[derive(Clone)]
pub struct JobQueue {
    tx: SenderKind,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Enqueue a job. The bounded variant fails with [`QueueError::Full`]
    /// when at capacity instead of blocking the submitter.
    pub fn enqueue(&self, job: ModerationJob) -> QueueResult<()> {
        let job_id = job.job_id.clone();
        match &self.tx {
            SenderKind::Bounded(tx) => tx.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })?,
            SenderKind::Unbounded(tx) => tx.send(job).map_err(|_| QueueError::Closed)?,
        }

        self.depth.fetch_add(1, Ordering::SeqCst);
        info!("Enqueued job {}", job_id);
        Ok(())
    }

    /// Reserve a queue slot without enqueueing yet.
    ///
    /// Lets the submission path surface backpressure before it has created
    /// any resource record or stored any payload. Dropping the permit
    /// releases the slot.
    pub fn reserve(&self) -> QueueResult<EnqueuePermit> {
        let inner = match &self.tx {
            SenderKind::Bounded(tx) => {
                let permit = tx.clone().try_reserve_owned().map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => QueueError::Full,
                    mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
                })?;
                PermitKind::Bounded(permit)
            }
            SenderKind::Unbounded(tx) => PermitKind::Unbounded(tx.clone()),
        };

        Ok(EnqueuePermit {
            inner,
            depth: Arc::clone(&self.depth),
        })
    }

    /// Current queue depth.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum PermitKind {
    Bounded(mpsc::OwnedPermit<ModerationJob>),
    Unbounded(mpsc::UnboundedSender<ModerationJob>),
}

/// A reserved queue slot. Consume with [`EnqueuePermit::enqueue`].
pub struct EnqueuePermit {
    inner: PermitKind,
    depth: Arc<AtomicUsize>,
}

impl EnqueuePermit {
    /// Enqueue a job into the reserved slot.
    pub fn enqueue(self, job: ModerationJob) {
        let job_id = job.job_id.clone();
        match self.inner {
            PermitKind::Bounded(permit) => {
                permit.send(job);
            }
            PermitKind::Unbounded(tx) => {
                if tx.send(job).is_err() {
                    warn!("Job {} dropped: queue closed during enqueue", job_id);
                    return;
                }
            }
        }
        self.depth.fetch_add(1, Ordering::SeqCst);
        info!("Enqueued job {}", job_id);
    }
}

/// Consumption handle shared by the worker pool.
///
/// Each job is delivered to exactly one caller of [`JobConsumer::dequeue`],
/// in submission order.
#[derive(Clone)]
pub struct JobConsumer {
    rx: Arc<Mutex<ReceiverKind>>,
    depth: Arc<AtomicUsize>,
}

impl JobConsumer {
    /// Claim the next job, suspending while the queue is empty.
    ///
    /// Returns `None` once every submission handle is dropped and the queue
    /// has drained.
    pub async fn dequeue(&self) -> Option<ModerationJob> {
        let mut rx = self.rx.lock().await;
        let job = match &mut *rx {
            ReceiverKind::Bounded(rx) => rx.recv().await,
            ReceiverKind::Unbounded(rx) => rx.recv().await,
        }?;

        self.depth.fetch_sub(1, Ordering::SeqCst);
        debug!("Claimed job {}", job.job_id);
        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use vhub_models::VideoId;

    fn job(tenant: &str) -> ModerationJob {
        ModerationJob::new(VideoId::new(), tenant)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, consumer) = channel(QueueConfig::default());

        let jobs: Vec<ModerationJob> = (0..5).map(|_| job("t1")).collect();
        for j in &jobs {
            queue.enqueue(j.clone()).unwrap();
        }

        for expected in &jobs {
            let claimed = consumer.dequeue().await.unwrap();
            assert_eq!(claimed.job_id, expected.job_id);
        }
    }

    #[tokio::test]
    async fn test_each_job_delivered_exactly_once() {
        let (queue, consumer) = channel(QueueConfig::default());

        let mut submitted = HashSet::new();
        for _ in 0..100 {
            let j = job("t1");
            submitted.insert(j.job_id.clone());
            queue.enqueue(j).unwrap();
        }
        drop(queue);

        let mut workers = Vec::new();
        for _ in 0..4 {
            let consumer = consumer.clone();
            workers.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(j) = consumer.dequeue().await {
                    claimed.push(j.job_id);
                }
                claimed
            }));
        }

        let mut delivered = Vec::new();
        for worker in workers {
            delivered.extend(worker.await.unwrap());
        }

        assert_eq!(delivered.len(), 100);
        let unique: HashSet<_> = delivered.into_iter().collect();
        assert_eq!(unique, submitted);
    }

    #[tokio::test]
    async fn test_bounded_queue_backpressure() {
        let (queue, _consumer) = channel(QueueConfig::bounded(2));

        queue.enqueue(job("t1")).unwrap();
        queue.enqueue(job("t1")).unwrap();
        assert!(matches!(queue.enqueue(job("t1")), Err(QueueError::Full)));
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_reserve_releases_slot_on_drop() {
        let (queue, _consumer) = channel(QueueConfig::bounded(1));

        let permit = queue.reserve().unwrap();
        assert!(matches!(queue.reserve(), Err(QueueError::Full)));

        drop(permit);
        let permit = queue.reserve().unwrap();
        permit.enqueue(job("t1"));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_dequeue_suspends_when_empty() {
        let (_queue, consumer) = channel(QueueConfig::default());

        let waited = tokio::time::timeout(Duration::from_millis(50), consumer.dequeue()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_dequeue_returns_none_when_closed() {
        let (queue, consumer) = channel(QueueConfig::bounded(4));
        queue.enqueue(job("t1")).unwrap();
        drop(queue);

        assert!(consumer.dequeue().await.is_some());
        assert!(consumer.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_wakes_waiting_consumer() {
        let (queue, consumer) = channel(QueueConfig::default());

        let waiter = tokio::spawn(async move { consumer.dequeue().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let j = job("t1");
        let expected = j.job_id.clone();
        queue.enqueue(j).unwrap();

        let claimed = waiter.await.unwrap().unwrap();
        assert_eq!(claimed.job_id, expected);
    }
}
