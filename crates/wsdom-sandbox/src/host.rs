//! Host-side handle to a sandbox thread.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;
use wsdom_protocols::{
    LogLevel, Mutation, SandboxError, SandboxInbound, SandboxOutbound, SerializedEvent,
};

use crate::module::ModuleRegistry;
use crate::script::{ExpressionHost, ScriptHost};
use crate::worker::SandboxWorker;

type PendingEvals = Arc<DashMap<String, oneshot::Sender<Result<Value, SandboxError>>>>;

/// Something the sandbox produced for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxEvent {
    /// Every mutation produced while handling one inbound message, in
    /// emission order. Never empty.
    Mutations(Vec<Mutation>),
    /// A message userland posted to the host.
    WorkerMessage(Value),
    /// Userland console output, arguments JSON-encoded.
    ClientLog {
        level: LogLevel,
        json_strings: Vec<String>,
    },
}

/// Handle to one sandbox.
///
/// The sandbox owns its document on a dedicated thread and is reached only
/// through messages. Dropping the handle terminates it.
pub struct Sandbox {
    inbound: Mutex<Option<mpsc::UnboundedSender<SandboxInbound>>>,
    pending: PendingEvals,
}

impl Sandbox {
    /// Start a sandbox with the built-in expression host.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        modules: Arc<ModuleRegistry>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SandboxEvent>), SandboxError> {
        Self::spawn_with_host(modules, Box::new(ExpressionHost))
    }

    pub fn spawn_with_host(
        modules: Arc<ModuleRegistry>,
        host: Box<dyn ScriptHost>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SandboxEvent>), SandboxError> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("wsdom-sandbox".to_string())
            .spawn(move || SandboxWorker::new(modules, host, outbound_tx).run(inbound_rx))
            .map_err(|e| SandboxError::SpawnFailed(e.to_string()))?;

        let pending: PendingEvals = Arc::new(DashMap::new());
        tokio::spawn(route_outbound(outbound_rx, events_tx, Arc::clone(&pending)));

        debug!("Sandbox started");
        Ok((
            Self {
                inbound: Mutex::new(Some(inbound_tx)),
                pending,
            },
            events_rx,
        ))
    }

    fn send(&self, message: SandboxInbound) -> Result<(), SandboxError> {
        let guard = self.inbound.lock();
        let sender = guard.as_ref().ok_or(SandboxError::Terminated)?;
        sender.send(message).map_err(|_| SandboxError::ChannelClosed)
    }

    /// Replace the sandbox document with `doc`. The sandbox answers with a
    /// body snapshot.
    pub fn init_dom(&self, doc: impl Into<String>, url: impl Into<String>) -> Result<(), SandboxError> {
        self.send(SandboxInbound::InitDom {
            doc: doc.into(),
            url: url.into(),
        })
    }

    pub fn dispatch_event(&self, event: SerializedEvent) -> Result<(), SandboxError> {
        self.send(SandboxInbound::ClientEvent { event })
    }

    /// Run the module registered under `url`. Failures are reported as
    /// client logs, not here.
    pub fn import(&self, url: impl Into<String>) -> Result<(), SandboxError> {
        self.send(SandboxInbound::DomImport { url: url.into() })
    }

    pub fn post_worker_message(&self, message: &Value) -> Result<(), SandboxError> {
        self.send(SandboxInbound::WorkerMessage {
            json_string: message.to_string(),
        })
    }

    pub fn request_initial_dom(&self) -> Result<(), SandboxError> {
        self.send(SandboxInbound::RequestInitialDom)
    }

    /// Evaluate `code` and wait for its result.
    ///
    /// Concurrent evaluations are correlated by id and resolve independently.
    pub async fn eval_string(&self, code: impl Into<String>) -> Result<Value, SandboxError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if let Err(e) = self.send(SandboxInbound::EvalString {
            code: code.into(),
            id: id.clone(),
        }) {
            self.pending.remove(&id);
            return Err(e);
        }

        rx.await.unwrap_or(Err(SandboxError::Terminated))
    }

    /// Stop the sandbox. Pending evaluations fail with
    /// [`SandboxError::Terminated`].
    pub fn terminate(&self) {
        if self.inbound.lock().take().is_some() {
            info!("Terminating sandbox");
        }
        self.pending.clear();
    }

    pub fn is_terminated(&self) -> bool {
        self.inbound.lock().is_none()
    }

    pub fn pending_evals(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("terminated", &self.is_terminated())
            .field("pending_evals", &self.pending.len())
            .finish()
    }
}

async fn route_outbound(
    mut outbound: mpsc::UnboundedReceiver<SandboxOutbound>,
    events: mpsc::UnboundedSender<SandboxEvent>,
    pending: PendingEvals,
) {
    let mut burst = Vec::new();
    while let Some(message) = outbound.recv().await {
        let event = match message {
            SandboxOutbound::Mutation { mutation } => {
                burst.push(mutation);
                continue;
            }
            SandboxOutbound::TurnEnd if burst.is_empty() => continue,
            SandboxOutbound::TurnEnd => {
                trace!("Sandbox turn produced {} mutations", burst.len());
                SandboxEvent::Mutations(std::mem::take(&mut burst))
            }
            SandboxOutbound::EvalResult {
                id,
                json_string,
                error,
            } => {
                resolve_eval(&pending, &id, &json_string, error);
                continue;
            }
            SandboxOutbound::WorkerMessage { json_string } => {
                match serde_json::from_str(&json_string) {
                    Ok(value) => SandboxEvent::WorkerMessage(value),
                    Err(e) => {
                        warn!("Dropping unparseable worker message: {}", e);
                        continue;
                    }
                }
            }
            SandboxOutbound::ClientLog {
                level,
                json_strings,
            } => {
                log_userland(level, &json_strings);
                SandboxEvent::ClientLog {
                    level,
                    json_strings,
                }
            }
        };
        if events.send(event).is_err() {
            debug!("Sandbox event receiver dropped");
        }
    }
    if !burst.is_empty() {
        debug!("Sandbox closed mid-turn, dropping {} mutations", burst.len());
    }
    pending.clear();
    debug!("Sandbox outbound closed");
}

fn resolve_eval(pending: &PendingEvals, id: &str, json_string: &str, error: Option<String>) {
    let Some((_, tx)) = pending.remove(id) else {
        debug!("Eval result for unknown id: {}", id);
        return;
    };
    let result = match error {
        Some(error) => Err(SandboxError::EvalFailed(error)),
        None => serde_json::from_str(json_string).map_err(|e| SandboxError::EvalFailed(e.to_string())),
    };
    let _ = tx.send(result);
}

fn log_userland(level: LogLevel, args: &[String]) {
    let line = args.join(" ");
    match level {
        LogLevel::Error => error!("[userland] {}", line),
        LogLevel::Warn => warn!("[userland] {}", line),
        LogLevel::Debug => debug!("[userland] {}", line),
        LogLevel::Log | LogLevel::Info => info!("[userland] {}", line),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wsdom_dom::DomCapabilities;
    use wsdom_protocols::NodeRef;

    use super::*;

    fn spawn(modules: ModuleRegistry) -> (Sandbox, mpsc::UnboundedReceiver<SandboxEvent>) {
        Sandbox::spawn(Arc::new(modules)).unwrap()
    }

    async fn next(events: &mut mpsc::UnboundedReceiver<SandboxEvent>) -> SandboxEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for sandbox event")
            .expect("sandbox event stream closed")
    }

    #[tokio::test]
    async fn test_init_dom_emits_snapshot() {
        let (sandbox, mut events) = spawn(ModuleRegistry::new());
        sandbox
            .init_dom("<html><body><p>Hi</p></body></html>", "http://localhost/")
            .unwrap();
        assert_eq!(
            next(&mut events).await,
            SandboxEvent::Mutations(vec![Mutation::body_snapshot("<p>Hi</p>")])
        );
    }

    #[tokio::test]
    async fn test_one_message_yields_one_burst() {
        let modules = ModuleRegistry::new();
        modules
            .register_fn("app://list", |userland| {
                let body = userland.document().body().unwrap();
                for _ in 0..300 {
                    let item = userland.dom_mut().create_element("li", None);
                    userland.dom_mut().append_child(body, item)?;
                }
                userland.console(LogLevel::Info, &[json!("built")]);
                Ok(())
            })
            .unwrap();
        let (sandbox, mut events) = spawn(modules);
        sandbox.init_dom("<body></body>", "http://localhost/").unwrap();
        sandbox.import("app://list").unwrap();
        next(&mut events).await;

        // Logs are forwarded as they happen; mutations wait for the turn.
        assert!(matches!(next(&mut events).await, SandboxEvent::ClientLog { .. }));
        match next(&mut events).await {
            SandboxEvent::Mutations(burst) => {
                assert_eq!(burst.len(), 600);
                assert_eq!(burst[0].tag(), "createElement");
                assert_eq!(burst[599].tag(), "appendChild");
            }
            other => panic!("expected mutations, got {:?}", other),
        }

        // A turn without mutations produces no event.
        assert_eq!(sandbox.eval_string("1").await.unwrap(), json!(1));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_eval_string_round_trip() {
        let (sandbox, mut events) = spawn(ModuleRegistry::new());
        sandbox.init_dom("<body></body>", "http://localhost/").unwrap();
        next(&mut events).await;

        let value = sandbox.eval_string("document.body.innerHTML = 'x'").await.unwrap();
        assert_eq!(value, json!("x"));
        assert_eq!(
            next(&mut events).await,
            SandboxEvent::Mutations(vec![Mutation::SetProperty {
                target: NodeRef::body(),
                name: "innerHTML".to_string(),
                value: "x".to_string(),
            }])
        );
        assert_eq!(sandbox.pending_evals(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_evals_resolve_independently() {
        let (sandbox, _events) = spawn(ModuleRegistry::new());
        sandbox.init_dom("<body></body>", "http://localhost/").unwrap();

        let (a, b) = tokio::join!(sandbox.eval_string("'a'"), sandbox.eval_string("'b'"));
        assert_eq!(a.unwrap(), json!("a"));
        assert_eq!(b.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_eval_error_is_reported() {
        let (sandbox, _events) = spawn(ModuleRegistry::new());
        sandbox.init_dom("<body></body>", "http://localhost/").unwrap();

        let err = sandbox.eval_string("missing").await.unwrap_err();
        assert_eq!(
            err,
            SandboxError::EvalFailed("ReferenceError: missing is not defined".to_string())
        );
        // The sandbox keeps running after a failed eval.
        assert_eq!(sandbox.eval_string("1").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_worker_messages_and_logs() {
        let modules = ModuleRegistry::new();
        modules
            .register_fn("app://echo", |userland| {
                userland.add_message_listener(|userland, message| {
                    userland.console(LogLevel::Info, &[message.clone()]);
                    userland.post_message(message);
                });
                Ok(())
            })
            .unwrap();
        let (sandbox, mut events) = spawn(modules);
        sandbox.init_dom("<body></body>", "http://localhost/").unwrap();
        sandbox.import("app://echo").unwrap();
        next(&mut events).await;

        sandbox.post_worker_message(&json!({"hello": true})).unwrap();
        assert_eq!(
            next(&mut events).await,
            SandboxEvent::ClientLog {
                level: LogLevel::Info,
                json_strings: vec![r#"{"hello":true}"#.to_string()],
            }
        );
        assert_eq!(
            next(&mut events).await,
            SandboxEvent::WorkerMessage(json!({"hello": true}))
        );
    }

    #[tokio::test]
    async fn test_terminate() {
        let (sandbox, mut events) = spawn(ModuleRegistry::new());
        sandbox.terminate();
        assert!(sandbox.is_terminated());
        assert_eq!(sandbox.request_initial_dom(), Err(SandboxError::Terminated));
        assert_eq!(
            sandbox.eval_string("1").await.unwrap_err(),
            SandboxError::Terminated
        );
        let closed = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }
}
