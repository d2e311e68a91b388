//! Errors raised inside the sandbox.

use thiserror::Error;
use wsdom_dom::DomError;

/// Failure evaluating a script string.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Module registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("Module already registered: {0}")]
    AlreadyRegistered(String),
}
