//! Wire decoding errors.

use thiserror::Error;

/// Errors raised while decoding wire or sandbox messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unknown {kind} tag: {tag}")]
    UnknownTag { kind: &'static str, tag: String },

    #[error("Transport error: {0}")]
    Transport(#[from] super::TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
