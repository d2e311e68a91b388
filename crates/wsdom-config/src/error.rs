//! Errors raised while producing a [`Config`](crate::Config).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file itself is missing.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// `document.html_path` points at nothing.
    #[error("Document markup not found: {0}")]
    DocumentNotFound(String),

    #[error("Failed to read document markup {path}: {source}")]
    DocumentRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    /// First error reported by [`ConfigValidator`](crate::ConfigValidator).
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference with no matching environment variable.
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
