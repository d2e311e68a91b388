//! # wsdom Protocols
//!
//! Wire-level definitions for remote-DOM synchronization.
//! Contains only data types and interface definitions - no DOM logic.
//!
//! ## Core Types
//!
//! - [`NodeRef`] - How either side names a node
//! - [`Mutation`] - One replayable DOM change, encoded positionally
//! - [`SerializedEvent`] - A captured client event
//! - [`WireMessage`] - Client ⇄ server envelope
//! - [`SandboxInbound`] / [`SandboxOutbound`] - Host ⇄ sandbox envelopes
//! - [`Transport`] - Outbound channel to a client

pub mod error;
pub mod event;
pub mod message;
pub mod mutation;
pub mod node_ref;
pub mod transport;

pub use error::{ProtocolError, SandboxError, TransportError};
pub use event::{
    ChangeEvent, ClickEvent, EventBase, EventCategory, FocusEvent, GenericEvent, InputEvent,
    KeyboardEvent, Modifiers, MouseEvent, SerializedEvent, SubmitEvent, IMMEDIATE_EVENT_TYPES,
    POINTER_MOTION_EVENT_TYPES,
};
pub use message::{LogLevel, SandboxInbound, SandboxOutbound, WireMessage};
pub use mutation::{InsertPosition, Mutation, MutationBatch, MutationKind, PrependItem};
pub use node_ref::{NodeRef, StashId, BODY_XPATH};
pub use transport::Transport;
