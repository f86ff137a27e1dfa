//! WebSocket message types.
//!
//! Wire field names stay camelCase for compatibility with the existing
//! web client.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{StatusEvent, VideoStatus};

/// Server-to-client WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Join handshake acknowledged
    Joined {
        #[serde(rename = "tenantId")]
        tenant_id: String,
    },

    /// A video's status/progress changed
    ProcessingUpdate {
        #[serde(rename = "videoId")]
        video_id: String,
        status: VideoStatus,
        progress: u8,
    },

    /// Error message
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl WsMessage {
    /// Create a join acknowledgement.
    pub fn joined(tenant_id: impl Into<String>) -> Self {
        WsMessage::Joined {
            tenant_id: tenant_id.into(),
        }
    }

    /// Create a processing update from a status event.
    pub fn update(event: &StatusEvent) -> Self {
        WsMessage::ProcessingUpdate {
            video_id: event.video_id.to_string(),
            status: event.status,
            progress: event.progress,
        }
    }

    /// Create an error message.
    pub fn error(message: impl Into<String>) -> Self {
        WsMessage::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Client-to-server join handshake.
///
/// The first message on a fresh connection; carries the bearer token whose
/// subject becomes the connection's tenant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsJoinRequest {
    Join { token: String },
}
