//! Envelopes exchanged over the client transport and the sandbox boundary.

use serde::{Deserialize, Serialize};

use crate::event::SerializedEvent;
use crate::mutation::{Mutation, MutationBatch};

/// Log level of a forwarded userland log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Message on the client ⇄ server transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireMessage {
    MutationBatch {
        mutations: MutationBatch,
    },
    Event {
        event: SerializedEvent,
    },
    Error {
        error: String,
        #[serde(rename = "errorInfo")]
        error_info: String,
    },
    ClientLog {
        level: LogLevel,
        #[serde(rename = "jsonStrings")]
        json_strings: Vec<String>,
    },
}

impl WireMessage {
    pub fn batch(mutations: Vec<Mutation>) -> Self {
        Self::MutationBatch {
            mutations: MutationBatch::new(mutations),
        }
    }

    pub fn error(error: impl Into<String>, error_info: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            error_info: error_info.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Message from the host into the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SandboxInbound {
    InitDom {
        doc: String,
        url: String,
    },
    ClientEvent {
        event: SerializedEvent,
    },
    DomImport {
        url: String,
    },
    EvalString {
        code: String,
        id: String,
    },
    WorkerMessage {
        #[serde(rename = "jsonString")]
        json_string: String,
    },
    RequestInitialDom,
}

/// Message from the sandbox back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SandboxOutbound {
    Mutation {
        mutation: Mutation,
    },
    EvalResult {
        id: String,
        #[serde(rename = "jsonString")]
        json_string: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    WorkerMessage {
        #[serde(rename = "jsonString")]
        json_string: String,
    },
    ClientLog {
        level: LogLevel,
        #[serde(rename = "jsonStrings")]
        json_strings: Vec<String>,
    },
    /// The sandbox finished handling one inbound message. Mutations sent
    /// since the previous marker belong to one burst.
    TurnEnd,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
