//! Status event fan-out.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use vhub_models::StatusEvent;

use crate::registry::TenantRegistry;

/// Default bound on a single per-connection send.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers status events to every live connection of a tenant.
///
/// Delivery is best-effort and at-most-once per currently connected
/// receiver: no replay buffer, connections joining later re-fetch current
/// state through the store's read path instead.
pub struct NotificationBus {
    registry: Arc<TenantRegistry>,
    send_timeout: Duration,
}

impl NotificationBus {
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self {
            registry,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the per-connection send bound.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Publish an event to all of the tenant's live connections.
    ///
    /// Sends run concurrently, each bounded by the send timeout; a failure
    /// on one connection never aborts delivery to the others and never
    /// surfaces to the caller. Returns the number of successful deliveries.
    pub async fn publish(&self, tenant_id: &str, event: StatusEvent) -> usize {
        let connections = self.registry.connections_for(tenant_id).await;

        if connections.is_empty() {
            debug!(tenant = %tenant_id, video_id = %event.video_id, "No live connections, publish is a no-op");
            return 0;
        }

        let sends = connections.into_iter().map(|(connection_id, tx)| {
            let event = event.clone();
            let send_timeout = self.send_timeout;
            async move {
                match timeout(send_timeout, tx.send(event)).await {
                    Ok(Ok(())) => true,
                    Ok(Err(_)) => {
                        warn!(connection = %connection_id, "Dropped event: connection channel closed");
                        false
                    }
                    Err(_) => {
                        warn!(connection = %connection_id, "Dropped event: send timed out");
                        false
                    }
                }
            }
        });

        let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();
        debug!(
            tenant = %tenant_id,
            video_id = %event.video_id,
            status = %event.status,
            delivered,
            "Published status event"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ConnectionId;
    use tokio::sync::mpsc;
    use vhub_models::{VideoId, VideoStatus};

    fn event(tenant: &str) -> StatusEvent {
        StatusEvent::new(VideoId::new(), tenant, VideoStatus::Safe, 100)
    }

    #[tokio::test]
    async fn test_publish_without_connections_is_noop() {
        let registry = Arc::new(TenantRegistry::new());
        let bus = NotificationBus::new(registry);

        let delivered = bus.publish("t1", event("t1")).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_connection() {
        let registry = Arc::new(TenantRegistry::new());
        let bus = NotificationBus::new(Arc::clone(&registry));

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        registry.join("t1", ConnectionId::new(), tx1).await;
        registry.join("t1", ConnectionId::new(), tx2).await;

        let published = event("t1");
        let delivered = bus.publish("t1", published.clone()).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap(), published);
        assert_eq!(rx2.recv().await.unwrap(), published);
    }

    #[tokio::test]
    async fn test_dead_connection_does_not_block_others() {
        let registry = Arc::new(TenantRegistry::new());
        let bus = NotificationBus::new(Arc::clone(&registry));

        let (dead_tx, dead_rx) = mpsc::channel(8);
        drop(dead_rx);
        let (live_tx, mut live_rx) = mpsc::channel(8);

        registry.join("t1", ConnectionId::new(), dead_tx).await;
        registry.join("t1", ConnectionId::new(), live_tx).await;

        let delivered = bus.publish("t1", event("t1")).await;

        assert_eq!(delivered, 1);
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_slow_connection_bounded_by_timeout() {
        let registry = Arc::new(TenantRegistry::new());
        let bus = NotificationBus::new(Arc::clone(&registry))
            .with_send_timeout(Duration::from_millis(50));

        // Full channel with a receiver that never reads
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        slow_tx.send(event("t1")).await.unwrap();
        let (live_tx, mut live_rx) = mpsc::channel(8);

        registry.join("t1", ConnectionId::new(), slow_tx).await;
        registry.join("t1", ConnectionId::new(), live_tx).await;

        let start = std::time::Instant::now();
        let delivered = bus.publish("t1", event("t1")).await;

        assert_eq!(delivered, 1);
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_events_not_routed_across_tenants() {
        let registry = Arc::new(TenantRegistry::new());
        let bus = NotificationBus::new(Arc::clone(&registry));

        let (tx, mut rx) = mpsc::channel(8);
        registry.join("t2", ConnectionId::new(), tx).await;

        let delivered = bus.publish("t1", event("t1")).await;

        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }
}
