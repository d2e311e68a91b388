//! Server errors.

use thiserror::Error;
use wsdom_config::ConfigError;
use wsdom_protocols::SandboxError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
