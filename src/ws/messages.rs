//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Optional on client messages.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated message.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message answering request `id`.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
///
/// Ids are trigger or event type ids; `"*"` in either list subscribes to
/// everything. `jobs` toggles whether the connection takes job requests as
/// a worker.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WsCommand {
    /// Start receiving notifications for the given triggers and event types.
    Subscribe {
        /// Trigger ids.
        #[serde(default)]
        trigger_ids: Vec<String>,
        /// Event type ids.
        #[serde(default)]
        event_type_ids: Vec<String>,
        /// Register as a job worker.
        #[serde(default)]
        jobs: bool,
    },
    /// Stop receiving notifications for the given triggers and event types.
    Unsubscribe {
        /// Trigger ids.
        #[serde(default)]
        trigger_ids: Vec<String>,
        /// Event type ids.
        #[serde(default)]
        event_type_ids: Vec<String>,
        /// Stop taking job requests.
        #[serde(default)]
        jobs: bool,
    },
}
