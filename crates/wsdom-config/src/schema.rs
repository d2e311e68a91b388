//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wsdom_protocols::{IMMEDIATE_EVENT_TYPES, POINTER_MOTION_EVENT_TYPES};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub document: DocumentConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a disconnected session stays available for reconnects.
    /// `0` closes it as soon as its client goes away.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl_secs() -> u64 {
    300
}

/// The document each new session starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Inline markup, used unless `html_path` is set.
    #[serde(default = "default_html")]
    pub html: String,

    /// File to load the markup from. `~` is expanded.
    #[serde(default)]
    pub html_path: Option<PathBuf>,

    /// Document URL reported to userland.
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            html: default_html(),
            html_path: None,
            url: default_url(),
        }
    }
}

fn default_html() -> String {
    "<!DOCTYPE html><html><body></body></html>".to_string()
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

/// Client event capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Trailing-edge window for `debounced` types.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Types sent as soon as they are captured.
    #[serde(default = "default_captured")]
    pub captured: Vec<String>,

    /// Types rate-limited through the debouncer.
    #[serde(default = "default_debounced")]
    pub debounced: Vec<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            captured: default_captured(),
            debounced: default_debounced(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_captured() -> Vec<String> {
    IMMEDIATE_EVENT_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_debounced() -> Vec<String> {
    POINTER_MOTION_EVENT_TYPES
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// Per-session sandbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Module URLs imported into every new session.
    #[serde(default)]
    pub preload: Vec<String>,

    /// Capacity of the client-event broadcast channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            preload: Vec::new(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files. `~` is expanded.
    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// Write a daily log file next to console output.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "~/.wsdom/logs".to_string()
}

fn default_true() -> bool {
    true
}
