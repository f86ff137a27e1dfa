//! Axum API server binary.
//!
//! Hosts the HTTP/WS surface together with the in-process job queue, the
//! executor worker pool and the stale-resource sweeper.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vhub_api::{create_router, metrics, ApiConfig, AppState, JwtVerifier};
use vhub_notify::{NotificationBus, TenantRegistry};
use vhub_queue::{channel, QueueConfig};
use vhub_storage::{MemoryObjectStore, ObjectStore, R2MediaStore};
use vhub_store::{MemoryVideoStore, VideoStore};
use vhub_worker::{
    JobExecutor, MarkSafeProcessor, StaleResourceSweeper, SweeperConfig, TimeoutProcessor,
    WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vhub=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vhub-api");

    // Load configuration
    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let jwt = match JwtVerifier::from_env() {
        Ok(v) => Arc::new(v),
        Err(e) => {
            error!("Failed to configure auth: {}", e);
            std::process::exit(1);
        }
    };

    // Media storage: R2 when configured, in-memory otherwise
    let media: Arc<dyn ObjectStore> = match R2MediaStore::from_env() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("R2 storage not configured ({}), using in-memory store", e);
            Arc::new(MemoryObjectStore::new())
        }
    };

    let store: Arc<dyn VideoStore> = Arc::new(MemoryVideoStore::new());

    // Queue, registry and bus shared by the API and the worker pool
    let (queue, consumer) = channel(QueueConfig::from_env());
    let registry = Arc::new(TenantRegistry::new());
    let bus = Arc::new(NotificationBus::new(Arc::clone(&registry)));

    // Executor worker pool
    let worker_config = WorkerConfig::from_env();
    let processor = Arc::new(TimeoutProcessor::new(
        MarkSafeProcessor,
        worker_config.processing_timeout,
    ));
    let shutdown_timeout = worker_config.shutdown_timeout;
    let executor = Arc::new(JobExecutor::new(
        worker_config,
        consumer,
        Arc::clone(&store),
        Arc::clone(&bus),
        processor,
    ));
    let executor_task = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            if let Err(e) = executor.run().await {
                error!("Executor error: {}", e);
            }
        })
    };

    // Stale-resource sweeper
    let sweeper = StaleResourceSweeper::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        SweeperConfig::from_env(),
    );
    tokio::spawn(async move {
        sweeper.run().await;
    });

    // Initialize metrics
    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics())
    } else {
        None
    };

    // Create router
    let state = AppState::new(
        config.clone(),
        store,
        media,
        queue,
        registry,
        bus,
        jwt,
    );
    let app = create_router(state, metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Let in-flight jobs finish before exiting
    executor.shutdown();
    if tokio::time::timeout(shutdown_timeout, executor_task)
        .await
        .is_err()
    {
        warn!("Executor did not stop within {:?}", shutdown_timeout);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
