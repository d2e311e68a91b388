//! The mirror document.

use tracing::{debug, error, info, warn};
use wsdom_core::{apply_all, EventCapture, NodeStash};
use wsdom_dom::{Document, Event, NodeId, BLANK_DOCUMENT};
use wsdom_protocols::{LogLevel, WireMessage};

/// What handling one server message did.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorUpdate {
    /// A batch was replayed; `applied` of `total` mutations took effect.
    Applied { applied: usize, total: usize },
    /// Userland logged on the client console.
    Log {
        level: LogLevel,
        json_strings: Vec<String>,
    },
    /// The server rejected something this client sent.
    Error { error: String, error_info: String },
    /// A message a client never acts on.
    Ignored,
}

/// Client-held copy of a remote document.
#[derive(Debug)]
pub struct Mirror {
    doc: Document,
    stash: NodeStash,
}

impl Mirror {
    pub fn new(url: &str) -> Self {
        Self::from_document(Document::parse(BLANK_DOCUMENT, url))
    }

    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            stash: NodeStash::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn stash(&self) -> &NodeStash {
        &self.stash
    }

    /// Current `<body>` markup.
    pub fn body_html(&self) -> String {
        self.doc
            .body()
            .map(|body| self.doc.inner_html(body))
            .unwrap_or_default()
    }

    /// Apply one server message.
    pub fn handle_message(&mut self, message: &WireMessage) -> MirrorUpdate {
        match message {
            WireMessage::MutationBatch { mutations } => {
                let applied = apply_all(&mut self.doc, &mut self.stash, mutations.iter());
                debug!("Applied {}/{} mutations", applied, mutations.len());
                MirrorUpdate::Applied {
                    applied,
                    total: mutations.len(),
                }
            }
            WireMessage::ClientLog {
                level,
                json_strings,
            } => {
                log_remote(*level, json_strings);
                MirrorUpdate::Log {
                    level: *level,
                    json_strings: json_strings.clone(),
                }
            }
            WireMessage::Error { error, error_info } => {
                warn!("Server reported error: {} ({})", error, error_info);
                MirrorUpdate::Error {
                    error: error.clone(),
                    error_info: error_info.clone(),
                }
            }
            WireMessage::Event { event } => {
                debug!("Ignoring event message from server: {}", event.event_type());
                MirrorUpdate::Ignored
            }
        }
    }

    /// Run `capture` for `event` dispatched at `target` in this mirror.
    pub fn capture(&self, capture: &EventCapture, target: NodeId, event: &mut Event) -> bool {
        capture.capture(&self.doc, target, event)
    }
}

fn log_remote(level: LogLevel, json_strings: &[String]) {
    let line = json_strings.join(" ");
    match level {
        LogLevel::Error => error!("[remote] {}", line),
        LogLevel::Warn => warn!("[remote] {}", line),
        LogLevel::Debug => debug!("[remote] {}", line),
        LogLevel::Log | LogLevel::Info => info!("[remote] {}", line),
    }
}
