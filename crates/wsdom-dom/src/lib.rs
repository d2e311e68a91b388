//! # wsdom DOM
//!
//! Headless, arena-backed HTML document used both as the authoritative tree
//! inside a sandbox and as the mirror tree on the client side.
//!
//! ## Components
//!
//! - [`Document`] - Node arena with tree operations, queries and markup I/O
//! - [`DomCapabilities`] - The mutating operation set, decorated by observers
//! - [`PropertyValue`] - Script-visible property values and coercion
//! - [`Event`] - Synthetic events dispatched against the tree

pub mod capabilities;
pub mod document;
pub mod error;
pub mod event;
mod form;
pub mod html;
pub mod node;
pub mod property;
mod text;

pub use capabilities::DomCapabilities;
pub use document::{Document, NodeOrText, BLANK_DOCUMENT};
pub use error::DomError;
pub use event::{Event, EventDetail, InputDetail, KeyboardDetail, MouseDetail};
pub use node::{Attribute, ElementData, FormState, Node, NodeData, NodeId};
pub use property::{format_number, property_kind, PropertyKind, PropertyValue};
