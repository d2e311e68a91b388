//! # wsdom Channel - Web
//!
//! WebSocket server that gives every connected client its own
//! authoritative document.
//!
//! Each connection:
//! - Attaches to a [`DomSession`]. `/ws?session=<id>` resumes the live
//!   session with that id if there is one; otherwise a new session is
//!   started from the configured document and preload modules
//! - Receives mutation batches, starting with a body snapshot
//! - Sends captured events, which are replayed in the sandbox and published
//!   on the server's [`SessionEvent`] broadcast
//!
//! A session survives its client disconnecting. It is closed once it has
//! stayed detached for `session_ttl_secs`.
//!
//! ## Usage
//!
//! ```ignore
//! use wsdom_channel_web::{DomServer, DomServerConfig};
//!
//! let server = DomServer::new(DomServerConfig::default(), modules);
//! let addr = server.start().await?;
//! let mut events = server.subscribe();
//! ```

mod connection;
mod error;
mod server;
mod session;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use wsdom_config::{Config, ConfigLoader};
use wsdom_protocols::SerializedEvent;
use wsdom_sandbox::ModuleRegistry;

pub use connection::WebSocketConnection;
pub use error::ServerError;
pub use server::create_router;
pub use session::DomSession;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomServerConfig {
    /// Host to bind to (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (default: 8080). `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Markup every session starts from.
    #[serde(default = "default_html")]
    pub document_html: String,
    /// URL reported to userland.
    #[serde(default = "default_url")]
    pub document_url: String,
    /// Module URLs imported into every new session.
    #[serde(default)]
    pub preload: Vec<String>,
    /// Capacity of the session event broadcast.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Seconds a detached session waits for a reconnect before it is closed.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_html() -> String {
    "<!DOCTYPE html><html><body></body></html>".to_string()
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_channel_capacity() -> usize {
    256
}

fn default_session_ttl_secs() -> u64 {
    300
}

impl Default for DomServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            document_html: default_html(),
            document_url: default_url(),
            preload: Vec::new(),
            channel_capacity: default_channel_capacity(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl DomServerConfig {
    /// Build from the application config, reading `html_path` if set.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            document_html: ConfigLoader::document_html(config)?,
            document_url: config.document.url.clone(),
            preload: config.sandbox.preload.clone(),
            channel_capacity: config.sandbox.channel_capacity,
            session_ttl_secs: config.server.session_ttl_secs,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Something a session observed, published to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A client event, before it is replayed in the sandbox.
    ClientEvent {
        session_id: String,
        event: SerializedEvent,
    },
    /// A message userland posted to the host.
    WorkerMessage {
        session_id: String,
        message: serde_json::Value,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::ClientEvent { session_id, .. } | Self::WorkerMessage { session_id, .. } => {
                session_id
            }
        }
    }
}

/// State shared across handlers.
pub struct DomServerState {
    pub config: DomServerConfig,
    /// Modules importable into every session.
    pub modules: Arc<ModuleRegistry>,
    /// Live sessions by id.
    pub sessions: DashMap<String, Arc<DomSession>>,
    /// Session event broadcast.
    pub events_tx: broadcast::Sender<SessionEvent>,
    /// Cancelled when the server stops.
    pub shutdown: CancellationToken,
    pub started: AtomicBool,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl DomServerState {
    pub fn new(config: DomServerConfig, modules: Arc<ModuleRegistry>) -> Self {
        let (events_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            config,
            modules,
            sessions: DashMap::new(),
            events_tx,
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            started_at: chrono::Utc::now(),
        }
    }

    /// Close `session` once it has stayed detached for the configured TTL.
    ///
    /// A reconnect in the meantime cancels the expiry: the session is only
    /// closed if no transport was attached since this call.
    pub fn schedule_expiry(self: &Arc<Self>, session: Arc<DomSession>) {
        let attachments = session.attachments();
        let ttl = self.config.session_ttl();
        if ttl.is_zero() {
            self.expire(&session, attachments);
            return;
        }

        let state = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => state.expire(&session, attachments),
                _ = state.shutdown.cancelled() => {}
            }
        });
    }

    fn expire(&self, session: &Arc<DomSession>, attachments: u64) {
        // Checked under the map's shard lock, which reconnects also hold
        // while attaching.
        let removed = self.sessions.remove_if(session.id(), |_, current| {
            Arc::ptr_eq(current, session)
                && !current.is_attached()
                && current.attachments() == attachments
        });
        match removed {
            Some(_) => {
                session.close();
                info!("Session {} expired", session.id());
            }
            None => trace!("Session {} was resumed, keeping it", session.id()),
        }
    }
}

impl std::fmt::Debug for DomServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomServerState")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// The WebSocket server.
pub struct DomServer {
    state: Arc<DomServerState>,
}

impl DomServer {
    pub fn new(config: DomServerConfig, modules: Arc<ModuleRegistry>) -> Self {
        Self {
            state: Arc::new(DomServerState::new(config, modules)),
        }
    }

    /// Configured listen address.
    pub fn address(&self) -> String {
        self.state.config.address()
    }

    pub fn state(&self) -> Arc<DomServerState> {
        self.state.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn session_count(&self) -> usize {
        self.state.sessions.len()
    }

    pub fn session(&self, id: &str) -> Option<Arc<DomSession>> {
        self.state.sessions.get(id).map(|s| Arc::clone(s.value()))
    }

    /// Receive every [`SessionEvent`] published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.events_tx.subscribe()
    }

    /// Bind and serve in the background. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{}: {}", self.address(), e)))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let router = create_router(self.state.clone());
        let shutdown = self.state.shutdown.clone();

        info!("wsdom server listening on ws://{}/ws", local_addr);
        self.state.started.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }

    /// Close every session and stop accepting connections.
    pub fn stop(&self) {
        if !self.state.started.swap(false, Ordering::SeqCst) {
            return;
        }
        self.state.shutdown.cancel();
        for entry in self.state.sessions.iter() {
            entry.value().close();
        }
        self.state.sessions.clear();
        debug!("wsdom server stopped");
    }
}
