//! String evaluation inside the sandbox.
//!
//! [`ExpressionHost`] understands a small expression language over the
//! userland globals: `document`, `window`, `localStorage`,
//! `sessionStorage` and `console`. Programs are `;`-separated statements of
//! member reads, method calls and property assignments:
//!
//! ```text
//! document.getElementById('out').textContent = 'done';
//! localStorage.getItem('theme')
//! ```
//!
//! The value of the last statement is the result. DOM writes go through the
//! instrumented document, so they reach the client like any other mutation.

mod eval;
mod parser;

use serde_json::Value;

use crate::error::EvalError;
use crate::userland::Userland;

/// Evaluates source strings against a [`Userland`].
pub trait ScriptHost: Send {
    fn eval(&mut self, userland: &mut Userland, code: &str) -> Result<Value, EvalError>;
}

/// Built-in [`ScriptHost`] for the expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionHost;

impl ScriptHost for ExpressionHost {
    fn eval(&mut self, userland: &mut Userland, code: &str) -> Result<Value, EvalError> {
        let statements = parser::parse(code)?;
        eval::Evaluator::new(userland).run(&statements)
    }
}
