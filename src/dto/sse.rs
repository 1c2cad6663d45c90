use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::board::BoardView;

/// Dispatched payload carried across SSE channels.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Event carrying a raw text payload.
    pub fn new(event: Option<String>, data: impl Into<String>) -> Self {
        Self {
            event,
            data: data.into(),
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Initial metadata sent to an SSE client when it connects.
#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Board at connection time.
    pub board: BoardView,
}

/// Broadcast when the backend enters or leaves degraded mode.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatus {
    pub degraded: bool,
}

/// Broadcast when the match was reset and a new one begins.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResetEvent {
    /// Identifier of the discarded match.
    pub previous_id: Uuid,
    /// Fresh board.
    pub board: BoardView,
}
