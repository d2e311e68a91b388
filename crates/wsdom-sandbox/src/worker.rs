//! The sandbox thread's message loop.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use wsdom_core::dispatch_client_event;
use wsdom_dom::Document;
use wsdom_protocols::{LogLevel, SandboxError, SandboxInbound, SandboxOutbound, SerializedEvent};

use crate::module::ModuleRegistry;
use crate::script::ScriptHost;
use crate::userland::Userland;

/// Owns the authoritative document and handles one inbound message at a
/// time.
pub(crate) struct SandboxWorker {
    modules: Arc<ModuleRegistry>,
    host: Box<dyn ScriptHost>,
    outbound: UnboundedSender<SandboxOutbound>,
    userland: Option<Userland>,
}

impl SandboxWorker {
    pub(crate) fn new(
        modules: Arc<ModuleRegistry>,
        host: Box<dyn ScriptHost>,
        outbound: UnboundedSender<SandboxOutbound>,
    ) -> Self {
        Self {
            modules,
            host,
            outbound,
            userland: None,
        }
    }

    /// Handle messages until every inbound sender is gone. Each handled
    /// message is followed by a turn marker.
    pub(crate) fn run(mut self, mut inbound: UnboundedReceiver<SandboxInbound>) {
        while let Some(message) = inbound.blocking_recv() {
            self.handle(message);
            self.send(SandboxOutbound::TurnEnd);
        }
        debug!("Sandbox inbound closed, worker exiting");
    }

    pub(crate) fn handle(&mut self, message: SandboxInbound) {
        match message {
            SandboxInbound::InitDom { doc, url } => self.init_dom(&doc, &url),
            SandboxInbound::ClientEvent { event } => self.client_event(&event),
            SandboxInbound::DomImport { url } => self.import(&url),
            SandboxInbound::EvalString { code, id } => self.eval(&code, id),
            SandboxInbound::WorkerMessage { json_string } => self.worker_message(&json_string),
            SandboxInbound::RequestInitialDom => self.send_snapshot(),
        }
    }

    fn send(&self, message: SandboxOutbound) {
        if self.outbound.send(message).is_err() {
            debug!("Sandbox outbound closed");
        }
    }

    fn init_dom(&mut self, doc: &str, url: &str) {
        info!("Initializing sandbox document: {}", url);
        self.userland = Some(Userland::new(
            Document::parse(doc, url),
            self.outbound.clone(),
        ));
        self.send_snapshot();
    }

    fn send_snapshot(&self) {
        match &self.userland {
            Some(userland) => self.send(SandboxOutbound::Mutation {
                mutation: userland.snapshot(),
            }),
            None => warn!("Snapshot requested before init-dom"),
        }
    }

    fn client_event(&mut self, event: &SerializedEvent) {
        let Some(userland) = self.userland.as_mut() else {
            warn!("Client event before init-dom: {}", event.event_type());
            return;
        };
        dispatch_client_event(userland.dom_mut(), event);
    }

    fn import(&mut self, url: &str) {
        let result = match (self.userland.as_mut(), self.modules.get(url)) {
            (None, _) => Err(SandboxError::NotInitialized),
            (Some(_), None) => Err(SandboxError::ModuleNotFound(url.to_string())),
            (Some(userland), Some(module)) => {
                debug!("Importing module: {}", url);
                module.run(userland).map_err(|e| SandboxError::ImportFailed {
                    url: url.to_string(),
                    message: format!("{:#}", e),
                })
            }
        };

        if let Err(e) = result {
            error!("Module import failed: {}", e);
            self.send(SandboxOutbound::ClientLog {
                level: LogLevel::Error,
                json_strings: vec![Value::String(e.to_string()).to_string()],
            });
        }
    }

    fn eval(&mut self, code: &str, id: String) {
        let result = match self.userland.as_mut() {
            Some(userland) => self.host.eval(userland, code).map_err(|e| e.to_string()),
            None => Err(SandboxError::NotInitialized.to_string()),
        };
        let message = match result {
            Ok(value) => SandboxOutbound::EvalResult {
                id,
                json_string: value.to_string(),
                error: None,
            },
            Err(error) => {
                debug!("Eval {} failed: {}", id, error);
                SandboxOutbound::EvalResult {
                    id,
                    json_string: Value::Null.to_string(),
                    error: Some(error),
                }
            }
        };
        self.send(message);
    }

    fn worker_message(&mut self, json_string: &str) {
        let Some(userland) = self.userland.as_mut() else {
            warn!("Worker message before init-dom");
            return;
        };
        match serde_json::from_str::<Value>(json_string) {
            Ok(message) => userland.deliver_message(&message),
            Err(e) => warn!("Invalid worker message: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
