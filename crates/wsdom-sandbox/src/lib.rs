//! # wsdom Sandbox
//!
//! Hosts the authoritative document on a dedicated thread that the rest of
//! the process reaches only through messages.
//!
//! ```text
//!  host                          sandbox thread
//! ┌───────────┐ SandboxInbound  ┌──────────────────────────────┐
//! │  Sandbox  │ ──────────────▶ │ SandboxWorker                │
//! │           │                 │   Userland ─ InstrumentedDom │
//! │  router   │ ◀────────────── │   ScriptHost, modules        │
//! └───────────┘ SandboxOutbound └──────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - [`Sandbox`] - Host handle: init, events, imports, id-correlated eval
//! - [`Userland`] - What imported modules and scripts can reach
//! - [`ModuleRegistry`] - Importable modules keyed by URL
//! - [`ScriptHost`] - String evaluation, [`ExpressionHost`] built in

pub mod error;
pub mod host;
pub mod module;
pub mod script;
pub mod storage;
pub mod userland;
mod worker;

pub use error::{EvalError, ModuleError};
pub use host::{Sandbox, SandboxEvent};
pub use module::{FnModule, ModuleRegistry, SandboxModule};
pub use script::{ExpressionHost, ScriptHost};
pub use storage::BrowserStorage;
pub use userland::{MessageListenerId, Userland};
