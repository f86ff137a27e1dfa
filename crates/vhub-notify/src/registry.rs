//! Live connection registry keyed by tenant.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use vhub_models::StatusEvent;

/// Opaque identifier for one live transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel through which a connection's forwarding task receives events.
pub type EventSender = mpsc::Sender<StatusEvent>;

#[derive(Default)]
struct RegistryInner {
    by_tenant: HashMap<String, HashMap<ConnectionId, EventSender>>,
    by_connection: HashMap<ConnectionId, String>,
}

/// Maps tenants to their currently live connections.
///
/// All mutation goes through one lock-guarded structure; callers never
/// synchronize externally. A connection belongs to at most one tenant at a
/// time: a later `join` re-homes it.
#[derive(Default)]
pub struct TenantRegistry {
    inner: RwLock<RegistryInner>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a tenant.
    ///
    /// Idempotent per connection; joining again under a different tenant
    /// replaces the previous mapping.
    pub async fn join(&self, tenant_id: &str, connection_id: ConnectionId, sender: EventSender) {
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.by_connection.insert(connection_id, tenant_id.to_string())
        {
            if previous != tenant_id {
                if let Some(connections) = inner.by_tenant.get_mut(&previous) {
                    connections.remove(&connection_id);
                    if connections.is_empty() {
                        inner.by_tenant.remove(&previous);
                    }
                }
                debug!(
                    connection = %connection_id,
                    from = %previous,
                    to = %tenant_id,
                    "Connection re-joined under a different tenant"
                );
            }
        }

        inner
            .by_tenant
            .entry(tenant_id.to_string())
            .or_default()
            .insert(connection_id, sender);

        debug!(connection = %connection_id, tenant = %tenant_id, "Connection joined");
    }

    /// Remove a connection from whatever tenant it was under.
    ///
    /// Safe to call repeatedly or for a connection that never joined.
    pub async fn leave(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;

        let Some(tenant_id) = inner.by_connection.remove(&connection_id) else {
            return;
        };

        if let Some(connections) = inner.by_tenant.get_mut(&tenant_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                inner.by_tenant.remove(&tenant_id);
            }
        }

        debug!(connection = %connection_id, tenant = %tenant_id, "Connection left");
    }

    /// Snapshot of the tenant's live connections.
    ///
    /// A point-in-time copy, not a live view: senders registered after the
    /// call are not included.
    pub async fn connections_for(&self, tenant_id: &str) -> Vec<(ConnectionId, EventSender)> {
        let inner = self.inner.read().await;
        inner
            .by_tenant
            .get(tenant_id)
            .map(|connections| {
                connections
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The tenant a connection is currently registered under.
    pub async fn tenant_of(&self, connection_id: ConnectionId) -> Option<String> {
        self.inner
            .read()
            .await
            .by_connection
            .get(&connection_id)
            .cloned()
    }

    /// Total live connections across all tenants.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.by_connection.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> (EventSender, mpsc::Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (tx, rx)
    }

    #[tokio::test]
    async fn test_join_and_snapshot() {
        let registry = TenantRegistry::new();
        let conn = ConnectionId::new();
        let (tx, _rx) = sender();

        registry.join("t1", conn, tx).await;

        let connections = registry.connections_for("t1").await;
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].0, conn);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_join_is_idempotent_per_connection() {
        let registry = TenantRegistry::new();
        let conn = ConnectionId::new();
        let (tx, _rx) = sender();

        registry.join("t1", conn, tx.clone()).await;
        registry.join("t1", conn, tx).await;

        assert_eq!(registry.connections_for("t1").await.len(), 1);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejoin_replaces_tenant_mapping() {
        let registry = TenantRegistry::new();
        let conn = ConnectionId::new();
        let (tx, _rx) = sender();

        registry.join("t1", conn, tx.clone()).await;
        registry.join("t2", conn, tx).await;

        assert!(registry.connections_for("t1").await.is_empty());
        assert_eq!(registry.connections_for("t2").await.len(), 1);
        assert_eq!(registry.tenant_of(conn).await.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_leave_is_safe_to_repeat() {
        let registry = TenantRegistry::new();
        let conn = ConnectionId::new();
        let (tx, _rx) = sender();

        registry.leave(conn).await;

        registry.join("t1", conn, tx).await;
        registry.leave(conn).await;
        registry.leave(conn).await;

        assert!(registry.connections_for("t1").await.is_empty());
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_not_live() {
        let registry = TenantRegistry::new();
        let snapshot = registry.connections_for("t1").await;

        let conn = ConnectionId::new();
        let (tx, _rx) = sender();
        registry.join("t1", conn, tx).await;

        assert!(snapshot.is_empty());
        assert_eq!(registry.connections_for("t1").await.len(), 1);
    }
}
