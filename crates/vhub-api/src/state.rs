//! Application state.

use std::sync::Arc;

use vhub_notify::{NotificationBus, TenantRegistry};
use vhub_queue::JobQueue;
use vhub_storage::ObjectStore;
use vhub_store::VideoStore;

use crate::auth::JwtVerifier;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn VideoStore>,
    pub media: Arc<dyn ObjectStore>,
    pub queue: JobQueue,
    pub registry: Arc<TenantRegistry>,
    pub bus: Arc<NotificationBus>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    /// Assemble application state from pre-built components.
    ///
    /// The binary wires these together because the queue's consumer half
    /// goes to the executor, not the router.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn VideoStore>,
        media: Arc<dyn ObjectStore>,
        queue: JobQueue,
        registry: Arc<TenantRegistry>,
        bus: Arc<NotificationBus>,
        jwt: Arc<JwtVerifier>,
    ) -> Self {
        Self {
            config,
            store,
            media,
            queue,
            registry,
            bus,
            jwt,
        }
    }
}
