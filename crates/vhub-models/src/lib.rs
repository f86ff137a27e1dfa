//! Shared data models for the VideoHub backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and lifecycle statuses
//! - Moderation jobs
//! - Status events published to connected clients
//! - WebSocket message schemas

pub mod event;
pub mod job;
pub mod video;
pub mod ws;

// Re-export common types
pub use event::StatusEvent;
pub use job::{JobId, ModerationJob};
pub use video::{VideoId, VideoRecord, VideoStatus};
pub use ws::{WsJoinRequest, WsMessage};
