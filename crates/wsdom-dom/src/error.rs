//! DOM errors.

use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("Syntax error: {0}")]
    Syntax(String),
}
