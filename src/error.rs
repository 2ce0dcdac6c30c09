//! Error types for Verdict
//!
//! This module defines the error types used throughout Verdict, following
//! a hierarchical structure with specific error variants for different
//! error categories.
//!
//! Rule *violations* are not errors: they are the engine's normal output and
//! travel inside [`crate::types::ValidationResult`]. [`RuleFault`] describes a
//! rule that failed to produce a verdict at all; the engine absorbs it into the
//! result model and only reports it on the diagnostic (tracing) channel.

use crate::types::RuleId;
use std::any::Any;

/// Boxed error returned by fallible rule evaluate functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration syntax
    #[error("Invalid configuration syntax: {0}")]
    InvalidSyntax(String),

    /// Missing required configuration field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid configuration value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// I/O error while reading a configuration or values file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidSyntax(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidSyntax(err.to_string())
    }
}

/// Rule-related errors
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Invalid rule definition
    #[error("Invalid rule definition: {0}")]
    InvalidDefinition(String),

    /// Rule not found
    #[error("Rule not found: {0}")]
    NotFound(String),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

/// A rule whose evaluate function failed instead of returning a verdict
#[derive(Debug, thiserror::Error)]
pub enum RuleFault {
    /// The evaluate function returned an error
    #[error("rule '{rule}' failed: {source}")]
    Failed {
        rule: RuleId,
        #[source]
        source: BoxError,
    },

    /// The evaluate function (or its future) panicked
    #[error("rule '{rule}' panicked: {message}")]
    Panicked { rule: RuleId, message: String },
}

impl RuleFault {
    /// The rule that faulted
    pub fn rule(&self) -> &RuleId {
        match self {
            RuleFault::Failed { rule, .. } | RuleFault::Panicked { rule, .. } => rule,
        }
    }
}

/// Top-level error type for Verdict
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
