//! Axum HTTP/WS API server.
//!
//! This crate provides:
//! - Video upload, listing, playback URL and status routes
//! - JWT bearer authentication with role-gated uploads
//! - WebSocket endpoint with tenant join handshake and live status events
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use auth::{AuthUser, Claims, JwtVerifier, Role};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
