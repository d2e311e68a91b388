//! Mirror client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// Failed to reach the server.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket error after connecting.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection is gone.
    #[error("Connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for MirrorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MirrorError::WebSocket(err.to_string())
    }
}
