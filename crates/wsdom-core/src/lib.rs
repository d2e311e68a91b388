//! # wsdom Core
//!
//! The synchronization engine shared by the authoritative side and the
//! mirror side.
//!
//! ## Architecture
//!
//! ```text
//!  authoritative side                          mirror side
//!  ──────────────────                          ───────────
//!  InstrumentedDom ──Mutation──▶ MutationBatcher ──batch──▶ replay::apply_all
//!        ▲                                                       │
//!        │                                                       ▼
//!  dispatch_client_event ◀──SerializedEvent── EventCapture ◀── Document
//! ```
//!
//! ## Components
//!
//! - [`NodeStash`] / [`compute_xpath`] - Naming nodes across both trees
//! - [`InstrumentedDom`] - Emits one [`Mutation`] per DOM operation
//! - [`replay`] - Applies mutations to a mirror document
//! - [`codec`] - Event capture, debouncing, reconstruction and simulation
//! - [`MutationBatcher`] - Collapses a burst of mutations into one message
//!
//! [`Mutation`]: wsdom_protocols::Mutation

pub mod batch;
pub mod codec;
pub mod interceptor;
pub mod replay;
pub mod resolver;

pub use batch::{FlushOutcome, FlushScheduler, MutationBatcher, TokioScheduler};
pub use codec::{
    click, dispatch_client_event, reconstruct_event, serialize_event, Debouncer, EventCapture,
    DEFAULT_DEBOUNCE_MS,
};
pub use interceptor::{EventContext, InstrumentedDom, ListenerId, MutationLog, MutationSink};
pub use replay::{apply_all, apply_mutation};
pub use resolver::{compute_xpath, evaluate_xpath, NodeStash, XPathExpr};
