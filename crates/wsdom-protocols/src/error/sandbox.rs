//! Sandbox errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Sandbox terminated")]
    Terminated,

    #[error("Sandbox DOM not initialized")]
    NotInitialized,

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Import failed for {url}: {message}")]
    ImportFailed { url: String, message: String },

    #[error("Eval failed: {0}")]
    EvalFailed(String),

    #[error("Sandbox channel closed")]
    ChannelClosed,

    #[error("Failed to start sandbox: {0}")]
    SpawnFailed(String),
}
