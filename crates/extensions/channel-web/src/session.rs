//! Per-client session.
//!
//! A session pairs one sandbox with at most one client transport at a time.
//! Mutations coming out of the sandbox are batched onto the transport; events
//! coming from the client are replayed in the sandbox. A session outlives
//! its transport: a client that reconnects under the same id is attached
//! again and receives a fresh body snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};
use wsdom_core::MutationBatcher;
use wsdom_protocols::{SandboxError, Transport, TransportError, WireMessage};
use wsdom_sandbox::{Sandbox, SandboxEvent};

use crate::error::ServerError;
use crate::{DomServerState, SessionEvent};

/// One client's view of an authoritative document.
pub struct DomSession {
    id: String,
    sandbox: Sandbox,
    batcher: Arc<MutationBatcher>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    /// Bumped on every attach.
    attachments: AtomicU64,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl DomSession {
    /// Spawn a sandbox, load the configured document and preloads, and
    /// start forwarding its output.
    ///
    /// With `transport` given, the initial body snapshot goes straight to
    /// it. Must be called from within a Tokio runtime.
    pub fn start(
        id: impl Into<String>,
        state: &DomServerState,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Arc<Self>, ServerError> {
        let id = id.into();
        let (sandbox, events) = Sandbox::spawn(Arc::clone(&state.modules))?;

        let batcher = Arc::new(MutationBatcher::new());
        if let Some(transport) = &transport {
            batcher.attach(Arc::clone(transport));
        }

        let attachments = AtomicU64::new(u64::from(transport.is_some()));
        let session = Arc::new(Self {
            id,
            sandbox,
            batcher,
            transport: RwLock::new(transport),
            attachments,
            events_tx: state.events_tx.clone(),
        });

        session
            .sandbox
            .init_dom(state.config.document_html.as_str(), state.config.document_url.as_str())?;
        for url in &state.config.preload {
            debug!("Preloading {} into session {}", url, session.id);
            session.sandbox.import(url.as_str())?;
        }

        tokio::spawn(pump(Arc::clone(&session), events));
        info!("Session {} started", session.id);
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Route output to `transport` and resend the full body.
    pub fn attach(&self, transport: Arc<dyn Transport>) -> Result<(), SandboxError> {
        {
            let mut current = self.transport.write();
            *current = Some(Arc::clone(&transport));
            self.attachments.fetch_add(1, Ordering::SeqCst);
            self.batcher.attach(transport);
        }
        self.sandbox.request_initial_dom()
    }

    /// Stop delivering to the client. The sandbox keeps running.
    pub fn detach(&self) {
        *self.transport.write() = None;
        self.batcher.detach();
    }

    /// Detach unless a live transport is attached, as after a reconnect
    /// replaced the one that just went away. Returns whether the session is
    /// now detached.
    pub fn detach_if_closed(&self) -> bool {
        let mut transport = self.transport.write();
        if (*transport).as_ref().is_some_and(|t| t.is_open()) {
            return false;
        }
        *transport = None;
        self.batcher.detach();
        true
    }

    /// How many times a transport has been attached. Changes whenever a
    /// client (re)connects.
    pub fn attachments(&self) -> u64 {
        self.attachments.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.transport.read().is_some()
    }

    fn send(&self, message: &WireMessage) -> Result<(), TransportError> {
        let transport = self.transport.read().clone();
        match transport {
            Some(t) if t.is_open() => t.send(message),
            _ => Err(TransportError::Closed),
        }
    }

    /// Handle one text frame from the client.
    pub fn handle_client_message(&self, text: &str) {
        match WireMessage::from_json(text) {
            Ok(WireMessage::Event { event }) => {
                trace!("Session {} received {}", self.id, event.event_type());
                let _ = self.events_tx.send(SessionEvent::ClientEvent {
                    session_id: self.id.clone(),
                    event: event.clone(),
                });
                if let Err(e) = self.sandbox.dispatch_event(event) {
                    warn!("Failed to dispatch event in session {}: {}", self.id, e);
                }
            }
            Ok(other) => {
                warn!("Ignoring unexpected client message in session {}: {:?}", self.id, other);
            }
            Err(e) => {
                warn!("Malformed client message in session {}: {}", self.id, e);
                if let Err(e) = self.send(&WireMessage::error("Invalid message", e.to_string())) {
                    debug!("Could not report error to client: {}", e);
                }
            }
        }
    }

    /// Evaluate `code` in this session's sandbox.
    pub async fn eval_string(&self, code: impl Into<String>) -> Result<Value, SandboxError> {
        self.sandbox.eval_string(code).await
    }

    pub fn import(&self, url: impl Into<String>) -> Result<(), SandboxError> {
        self.sandbox.import(url)
    }

    pub fn post_worker_message(&self, message: &Value) -> Result<(), SandboxError> {
        self.sandbox.post_worker_message(message)
    }

    /// Terminate the sandbox and drop the transport.
    pub fn close(&self) {
        self.sandbox.terminate();
        self.detach();
        debug!("Session {} closed", self.id);
    }

    pub fn is_closed(&self) -> bool {
        self.sandbox.is_terminated()
    }
}

impl std::fmt::Debug for DomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomSession")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

/// Forward sandbox output until the sandbox goes away.
async fn pump(session: Arc<DomSession>, mut events: mpsc::UnboundedReceiver<SandboxEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SandboxEvent::Mutations(burst) => session.batcher.extend(burst),
            SandboxEvent::ClientLog {
                level,
                json_strings,
            } => {
                if let Err(e) = session.send(&WireMessage::ClientLog {
                    level,
                    json_strings,
                }) {
                    trace!("Dropping client log for session {}: {}", session.id, e);
                }
            }
            SandboxEvent::WorkerMessage(message) => {
                let _ = session.events_tx.send(SessionEvent::WorkerMessage {
                    session_id: session.id.clone(),
                    message,
                });
            }
        }
    }
    debug!("Session {} output closed", session.id);
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
