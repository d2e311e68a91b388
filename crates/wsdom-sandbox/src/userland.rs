//! The environment userland code runs in.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use wsdom_core::InstrumentedDom;
use wsdom_dom::Document;
use wsdom_protocols::{LogLevel, Mutation, SandboxOutbound};

use crate::storage::BrowserStorage;

/// Identifies a registered message listener.
pub type MessageListenerId = u64;

type MessageListener = Rc<dyn Fn(&mut Userland, &Value)>;

/// Everything a module can reach: the instrumented document, storage,
/// worker messaging and client logging.
///
/// Mutations made through [`dom_mut`](Self::dom_mut) are forwarded out of
/// the sandbox as they happen.
pub struct Userland {
    dom: InstrumentedDom,
    url: String,
    local_storage: BrowserStorage,
    session_storage: BrowserStorage,
    message_listeners: Vec<(MessageListenerId, MessageListener)>,
    next_listener_id: MessageListenerId,
    outbound: UnboundedSender<SandboxOutbound>,
}

impl Userland {
    pub fn new(doc: Document, outbound: UnboundedSender<SandboxOutbound>) -> Self {
        let url = doc.url().to_string();
        let mutations = outbound.clone();
        let dom = InstrumentedDom::new(doc, move |mutation: Mutation| {
            if mutations
                .send(SandboxOutbound::Mutation { mutation })
                .is_err()
            {
                debug!("Sandbox outbound closed, mutation dropped");
            }
        });
        Self {
            dom,
            url,
            local_storage: BrowserStorage::new(),
            session_storage: BrowserStorage::new(),
            message_listeners: Vec::new(),
            next_listener_id: 0,
            outbound,
        }
    }

    pub fn dom(&self) -> &InstrumentedDom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut InstrumentedDom {
        &mut self.dom
    }

    pub fn document(&self) -> &Document {
        self.dom.document()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_storage(&self) -> &BrowserStorage {
        &self.local_storage
    }

    pub fn local_storage_mut(&mut self) -> &mut BrowserStorage {
        &mut self.local_storage
    }

    pub fn session_storage(&self) -> &BrowserStorage {
        &self.session_storage
    }

    pub fn session_storage_mut(&mut self) -> &mut BrowserStorage {
        &mut self.session_storage
    }

    // === Worker messages ===

    /// Listen for messages posted to the sandbox from the host.
    pub fn add_message_listener(
        &mut self,
        listener: impl Fn(&mut Userland, &Value) + 'static,
    ) -> MessageListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.message_listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn remove_message_listener(&mut self, id: MessageListenerId) -> bool {
        let before = self.message_listeners.len();
        self.message_listeners.retain(|(i, _)| *i != id);
        before != self.message_listeners.len()
    }

    /// Deliver `message` to every message listener.
    pub fn deliver_message(&mut self, message: &Value) {
        let listeners: Vec<MessageListener> = self
            .message_listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            (*listener)(self, message);
        }
    }

    /// Post `message` to the host.
    pub fn post_message(&self, message: &Value) {
        self.send(SandboxOutbound::WorkerMessage {
            json_string: message.to_string(),
        });
    }

    // === Logging ===

    /// Log `args` on the connected client's console.
    pub fn console(&self, level: LogLevel, args: &[Value]) {
        self.send(SandboxOutbound::ClientLog {
            level,
            json_strings: args.iter().map(Value::to_string).collect(),
        });
    }

    /// `SetProperty` replacing the body with its current markup.
    pub fn snapshot(&self) -> Mutation {
        let doc = self.dom.document();
        let html = doc.body().map(|b| doc.inner_html(b)).unwrap_or_default();
        Mutation::body_snapshot(html)
    }

    pub(crate) fn send(&self, message: SandboxOutbound) {
        if self.outbound.send(message).is_err() {
            warn!("Sandbox outbound closed");
        }
    }
}

impl fmt::Debug for Userland {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Userland")
            .field("url", &self.url)
            .field("dom", &self.dom)
            .field("message_listeners", &self.message_listeners.len())
            .finish_non_exhaustive()
    }
}
