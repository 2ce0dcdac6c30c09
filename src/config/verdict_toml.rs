//! Parsing and validation for verdict.toml rule files

use crate::error::ConfigError;
use crate::rules::builtin::Check;
use crate::types::{RuleId, TargetKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Message recorded for a rule whose evaluate function faulted
pub const DEFAULT_FAULT_MESSAGE: &str = "<rule faulted>";

/// Main configuration struct for verdict.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Verdict metadata
    pub verdict: VerdictMeta,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Declarative rules, in registration order
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        // Validate version
        if self.verdict.version != "1" {
            return Err(ConfigError::InvalidValue {
                field: "verdict.version".to_string(),
                message: format!(
                    "Unsupported configuration version '{}'. Expected '1'",
                    self.verdict.version
                ),
            });
        }

        if self.engine.fault_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "engine.fault_message".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let field = |name: &str| format!("rules.{}.{}", rule.id, name);

            if RuleId::new(rule.id.clone()).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "rules.id".to_string(),
                    message: format!(
                        "'{}' must be non-empty and contain only letters, digits, '-' or '_'",
                        rule.id
                    ),
                });
            }

            // Duplicate logic is allowed by the engine, but ids in a file
            // are how `verdict list` and error messages refer to rules
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "rules.id".to_string(),
                    message: format!("duplicate rule id '{}'", rule.id),
                });
            }

            if rule.targets.is_empty() {
                return Err(ConfigError::MissingField(field("targets")));
            }

            if rule.check == Check::Equal && rule.targets.len() < 2 {
                return Err(ConfigError::InvalidValue {
                    field: field("targets"),
                    message: "an 'equal' check needs at least two targets".to_string(),
                });
            }

            let zero_bound = match rule.check {
                Check::MinLength { min: 0 } => Some("min"),
                Check::MaxLength { max: 0 } => Some("max"),
                _ => None,
            };
            if let Some(bound) = zero_bound {
                return Err(ConfigError::InvalidValue {
                    field: field(bound),
                    message: "must be greater than zero".to_string(),
                });
            }

            rule.check
                .compile()
                .map_err(|e| ConfigError::InvalidValue {
                    field: field("pattern"),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}

/// Verdict metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictMeta {
    /// Configuration version (must be "1")
    pub version: String,
}

/// Engine behavior settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Message reported for a rule whose evaluate function faulted
    #[serde(default = "default_fault_message")]
    pub fault_message: String,
}

fn default_fault_message() -> String {
    DEFAULT_FAULT_MESSAGE.to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fault_message: default_fault_message(),
        }
    }
}

/// One declarative rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Rule identifier
    pub id: String,

    /// Targets the rule is bound to, in order
    pub targets: Vec<TargetKey>,

    /// The check to perform
    #[serde(flatten)]
    pub check: Check,

    /// Message reported when the check fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Simulated latency; makes the rule asynchronous
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Output configuration section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Color output setting
    #[serde(default)]
    pub color: ColorOption,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON Lines format
    Jsonl,
}

/// Color output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOption {
    /// Auto-detect based on terminal capabilities
    #[default]
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}
