//! Configuration validation.

use std::fmt;
use std::path::Path;

use wsdom_protocols::EventCategory;

use crate::error::ConfigError;
use crate::loader::ConfigLoader;
use crate::schema::Config;

/// Debounce windows above this are almost certainly a unit mistake.
const MAX_REASONABLE_DEBOUNCE_MS: u64 = 5_000;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError::InvalidValue`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_document(config, &mut result);
        Self::validate_events(config, &mut result);
        Self::validate_sandbox(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new(
                "server.host",
                "Host cannot be empty",
            ));
        }
    }

    fn validate_document(config: &Config, result: &mut ValidationResult) {
        match &config.document.html_path {
            Some(path) => {
                let expanded = ConfigLoader::expand_path(&path.to_string_lossy());
                if !Path::new(&expanded).exists() {
                    result.add_warning(ValidationWarning::new(
                        "document.html_path",
                        format!("Document file does not exist: {}", expanded),
                    ));
                }
            }
            None if config.document.html.trim().is_empty() => {
                result.add_error(ValidationError::new(
                    "document.html",
                    "Document markup cannot be empty",
                ));
            }
            None => {}
        }
    }

    fn validate_events(config: &Config, result: &mut ValidationResult) {
        let events = &config.events;

        if events.debounce_ms == 0 {
            result.add_error(ValidationError::new(
                "events.debounce_ms",
                "debounce_ms must be greater than 0",
            ));
        }

        if events.debounce_ms > MAX_REASONABLE_DEBOUNCE_MS {
            result.add_warning(ValidationWarning::new(
                "events.debounce_ms",
                format!(
                    "debounce_ms is very high (>{}ms), pointer events will lag",
                    MAX_REASONABLE_DEBOUNCE_MS
                ),
            ));
        }

        for (path, types) in [
            ("events.captured", &events.captured),
            ("events.debounced", &events.debounced),
        ] {
            for event_type in types {
                if EventCategory::from_type(event_type).is_none() {
                    result.add_error(ValidationError::new(
                        path,
                        format!("Unknown event type '{}'", event_type),
                    ));
                }
            }
        }

        for event_type in &events.captured {
            if events.debounced.contains(event_type) {
                result.add_error(ValidationError::new(
                    "events",
                    format!(
                        "Event type '{}' is both captured immediately and debounced",
                        event_type
                    ),
                ));
            }
        }
    }

    fn validate_sandbox(config: &Config, result: &mut ValidationResult) {
        if config.sandbox.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "sandbox.channel_capacity",
                "channel_capacity must be greater than 0",
            ));
        }

        for url in &config.sandbox.preload {
            if url.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "sandbox.preload",
                    "Preload module URL cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
