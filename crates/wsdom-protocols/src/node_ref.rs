//! Cross-side node addressing.
//!
//! A node is named either by a short-lived stash id (while it is not yet
//! reachable from the document root) or by a structural XPath (once it is).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a stashed node.
pub type StashId = u32;

/// Fixed anchor for the document body.
pub const BODY_XPATH: &str = "/html/body";

/// Reference to a node that both sides can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeRef {
    /// Node held in the stash under `id`.
    #[serde(rename = "stashed-id")]
    Stashed { id: StashId },
    /// Node reachable from the document root.
    #[serde(rename = "xpath")]
    XPath { xpath: String },
}

impl NodeRef {
    pub fn stashed(id: StashId) -> Self {
        Self::Stashed { id }
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath { xpath: path.into() }
    }

    /// Reference to `<body>`.
    pub fn body() -> Self {
        Self::xpath(BODY_XPATH)
    }

    /// Stash id, if this is a stashed reference.
    pub fn stash_id(&self) -> Option<StashId> {
        match self {
            Self::Stashed { id } => Some(*id),
            Self::XPath { .. } => None,
        }
    }

    pub fn is_stashed(&self) -> bool {
        matches!(self, Self::Stashed { .. })
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stashed { id } => write!(f, "stashed:{}", id),
            Self::XPath { xpath } => write!(f, "xpath:{}", xpath),
        }
    }
}
