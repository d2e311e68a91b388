//! WebSocket connection management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use wsdom_protocols::{Transport, TransportError, WireMessage};

use crate::{DomServerState, DomSession};

/// Outbound half of a client WebSocket.
///
/// Messages are serialized on the caller's side and written by the
/// connection task, so [`Transport::send`] never blocks.
#[derive(Debug, Clone)]
pub struct WebSocketConnection {
    /// Unique connection ID, shared with the session.
    pub id: String,
    tx: mpsc::UnboundedSender<String>,
    open: Arc<AtomicBool>,
}

impl WebSocketConnection {
    /// Create a connection and the receiver its writer drains.
    pub fn new(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            id: id.into(),
            tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        (conn, rx)
    }

    /// Mark the connection closed. Later sends fail.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl Transport for WebSocketConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    fn send(&self, message: &WireMessage) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let text = message
            .to_json()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.tx
            .send(text)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

/// Drive one client socket until either side closes or the server stops.
pub(crate) async fn run_connection(
    socket: WebSocket,
    conn: WebSocketConnection,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    session: Arc<DomSession>,
    state: Arc<DomServerState>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let conn_id = conn.id.clone();

    info!("WebSocket connection established: {}", conn_id);

    loop {
        tokio::select! {
            // Server -> client
            Some(text) = outbound_rx.recv() => {
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!("Failed to send message to {}: {}", conn_id, e);
                    break;
                }
            }

            // Client -> server
            result = ws_rx.next() => {
                match result {
                    Some(Ok(Message::Text(text))) => session.handle_client_message(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket connection closed: {}", conn_id);
                        break;
                    }
                    Some(Ok(_)) => {
                        debug!("Ignoring non-text frame from {}", conn_id);
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", conn_id, e);
                        break;
                    }
                }
            }

            _ = state.shutdown.cancelled() => {
                debug!("Server shutting down, closing {}", conn_id);
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    conn.close();
    if session.detach_if_closed() && !state.shutdown.is_cancelled() {
        debug!("Session {} detached, waiting for reconnect", session.id());
        state.schedule_expiry(session);
    }
    debug!("WebSocket connection removed: {}", conn_id);
}
