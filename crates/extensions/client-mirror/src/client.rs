//! WebSocket mirror client.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use wsdom_core::{EventCapture, DEFAULT_DEBOUNCE_MS};
use wsdom_dom::{Event, NodeId};
use wsdom_protocols::{
    SerializedEvent, WireMessage, IMMEDIATE_EVENT_TYPES, POINTER_MOTION_EVENT_TYPES,
};

use crate::error::MirrorError;
use crate::mirror::{Mirror, MirrorUpdate};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Which events the client captures and how pointer motion is throttled.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub captured: Vec<String>,
    pub debounced: Vec<String>,
    pub debounce: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            captured: IMMEDIATE_EVENT_TYPES.iter().map(|t| t.to_string()).collect(),
            debounced: POINTER_MOTION_EVENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Headless client mirroring one server session.
///
/// Incoming batches are replayed on a shared [`Mirror`]; events dispatched
/// through [`MirrorClient::dispatch`] are captured against it and sent
/// upstream.
pub struct MirrorClient {
    mirror: Arc<Mutex<Mirror>>,
    capture: EventCapture,
    events_tx: mpsc::UnboundedSender<SerializedEvent>,
    recv_task: tokio::task::JoinHandle<()>,
    send_task: tokio::task::JoinHandle<()>,
}

impl MirrorClient {
    /// Connect to a server's WebSocket endpoint.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let (client, mut updates) =
    ///     MirrorClient::connect("ws://127.0.0.1:8080/ws", CaptureOptions::default()).await?;
    /// ```
    pub async fn connect(
        url: &str,
        options: CaptureOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MirrorUpdate>), MirrorError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| MirrorError::ConnectionFailed(format!("{}: {}", url, e)))?;
        let (ws_sink, ws_source) = ws_stream.split();

        let mirror = Arc::new(Mutex::new(Mirror::new(url)));
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let capture = EventCapture::new(
            options.captured,
            options.debounced,
            options.debounce,
            events_tx.clone(),
        );

        let recv_task = tokio::spawn(Self::receive_loop(ws_source, mirror.clone(), updates_tx));
        let send_task = tokio::spawn(Self::send_loop(ws_sink, events_rx));

        debug!("Mirror client connected to {}", url);
        Ok((
            Self {
                mirror,
                capture,
                events_tx,
                recv_task,
                send_task,
            },
            updates_rx,
        ))
    }

    async fn receive_loop(
        mut ws_source: WsSource,
        mirror: Arc<Mutex<Mirror>>,
        updates: mpsc::UnboundedSender<MirrorUpdate>,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("Mirror recv: {}", text.as_str());
                    match WireMessage::from_json(text.as_str()) {
                        Ok(message) => {
                            let update = mirror.lock().handle_message(&message);
                            let _ = updates.send(update);
                        }
                        Err(e) => warn!("Failed to parse server message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    async fn send_loop(mut ws_sink: WsSink, mut events: mpsc::UnboundedReceiver<SerializedEvent>) {
        while let Some(event) = events.recv().await {
            let text = match (WireMessage::Event { event }).to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode event: {}", e);
                    continue;
                }
            };
            if let Err(e) = ws_sink.send(Message::Text(text.into())).await {
                warn!("Failed to send event: {}", e);
                break;
            }
        }
        let _ = ws_sink.close().await;
    }

    /// Dispatch `event` at `target` in the mirror, sending it upstream if it
    /// is captured.
    pub fn dispatch(&self, target: NodeId, mut event: Event) -> bool {
        self.mirror.lock().capture(&self.capture, target, &mut event)
    }

    /// Click the element with `id`. Returns `false` if there is none.
    pub fn click_by_id(&self, id: &str) -> bool {
        let target = self.mirror.lock().document().get_element_by_id(id);
        match target {
            Some(target) => self.dispatch(target, Event::new("click")),
            None => false,
        }
    }

    /// Send an already serialized event, bypassing capture.
    pub fn send_event(&self, event: SerializedEvent) -> Result<(), MirrorError> {
        self.events_tx.send(event).map_err(|_| MirrorError::Closed)
    }

    /// Run `f` against the mirror.
    pub fn with_mirror<R>(&self, f: impl FnOnce(&Mirror) -> R) -> R {
        f(&self.mirror.lock())
    }

    pub fn body_html(&self) -> String {
        self.mirror.lock().body_html()
    }

    /// Whether the server side is still delivering.
    pub fn is_connected(&self) -> bool {
        !self.recv_task.is_finished()
    }
}

impl Drop for MirrorClient {
    fn drop(&mut self) {
        self.recv_task.abort();
        self.send_task.abort();
    }
}

impl std::fmt::Debug for MirrorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorClient")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
