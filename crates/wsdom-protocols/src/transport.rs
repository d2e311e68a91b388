//! Transport abstraction.

use crate::error::TransportError;
use crate::message::WireMessage;

/// Persistent, ordered, reliable message channel to one client.
///
/// `send` must not block; implementations queue the message and deliver it
/// from their own task.
pub trait Transport: Send + Sync {
    /// Whether messages can currently be delivered.
    fn is_open(&self) -> bool;

    /// Queue `message` for delivery.
    fn send(&self, message: &WireMessage) -> Result<(), TransportError>;
}
