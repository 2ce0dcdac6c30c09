#![forbid(unsafe_code)]

//! Built-in declarative checks
//!
//! Rule files name one of these checks instead of supplying code. Each check
//! reads its targets' values from a [`Record`] and compiles into an ordinary
//! [`RuleDescriptor`], so the engine treats declared and hand-written rules
//! identically.
//!
//! Apart from `required` and `equal`, checks ignore empty values: whether a
//! field must be filled in is the `required` check's business.

use crate::config::RuleDefinition;
use crate::error::RuleError;
use crate::record::Record;
use crate::rules::RuleDescriptor;
use crate::types::{RuleResult, TargetKey};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The check a declarative rule performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// Every target holds a non-blank value
    Required,
    /// Every non-empty target has at least `min` characters
    MinLength { min: usize },
    /// Every non-empty target has at most `max` characters
    MaxLength { max: usize },
    /// Every non-empty target matches the regular expression
    Pattern { pattern: String },
    /// All targets hold the same value
    Equal,
    /// No non-empty target holds one of the listed values
    NotIn { values: Vec<String> },
}

impl Check {
    /// Name of the check as written in rule files
    pub fn kind(&self) -> &'static str {
        match self {
            Check::Required => "required",
            Check::MinLength { .. } => "min_length",
            Check::MaxLength { .. } => "max_length",
            Check::Pattern { .. } => "pattern",
            Check::Equal => "equal",
            Check::NotIn { .. } => "not_in",
        }
    }

    /// Message used when a rule file does not provide one
    pub fn default_message(&self, targets: &[TargetKey]) -> String {
        let subject = targets
            .first()
            .map(|key| key.as_str())
            .unwrap_or("value");
        match self {
            Check::Required => format!("{} is required", subject),
            Check::MinLength { min } => {
                format!("{} must be at least {} characters", subject, min)
            }
            Check::MaxLength { max } => {
                format!("{} must be at most {} characters", subject, max)
            }
            Check::Pattern { .. } => format!("{} has an invalid format", subject),
            Check::Equal => {
                let names: Vec<&str> = targets.iter().map(|key| key.as_str()).collect();
                format!("{} must match", names.join(" and "))
            }
            Check::NotIn { .. } => format!("{} is not allowed", subject),
        }
    }

    /// Compile the check, validating any regular expression
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidRegex` if a `pattern` check does not compile.
    pub fn compile(&self) -> Result<CompiledCheck, RuleError> {
        let pattern = match self {
            Check::Pattern { pattern } => Some(Regex::new(pattern).map_err(|e| {
                RuleError::InvalidRegex(format!("Failed to compile pattern '{}': {}", pattern, e))
            })?),
            _ => None,
        };

        Ok(CompiledCheck {
            check: self.clone(),
            pattern,
        })
    }
}

/// A check ready to run against field values
#[derive(Debug, Clone)]
pub struct CompiledCheck {
    check: Check,
    pattern: Option<Regex>,
}

impl CompiledCheck {
    /// True when the values (one per target, in target order) pass the check
    pub fn passes(&self, values: &[String]) -> bool {
        let filled = || values.iter().filter(|value| !value.is_empty());

        match &self.check {
            Check::Required => values.iter().all(|value| !value.trim().is_empty()),
            Check::MinLength { min } => filled().all(|value| value.chars().count() >= *min),
            Check::MaxLength { max } => filled().all(|value| value.chars().count() <= *max),
            Check::Pattern { .. } => match &self.pattern {
                Some(regex) => filled().all(|value| regex.is_match(value)),
                None => true,
            },
            Check::Equal => values.windows(2).all(|pair| pair[0] == pair[1]),
            Check::NotIn { values: forbidden } => {
                filled().all(|value| !forbidden.iter().any(|f| f == value))
            }
        }
    }
}

/// Build a descriptor for a declarative rule reading from `record`
///
/// A definition with `latency_ms` becomes an asynchronous rule: it captures
/// the values when the evaluation starts and reports after the delay, the way
/// a remote lookup would.
///
/// # Errors
///
/// Returns `RuleError` if the rule id is invalid, no targets are declared, or
/// the check does not compile.
pub fn descriptor(definition: &RuleDefinition, record: &Record) -> Result<RuleDescriptor, RuleError> {
    let compiled = Arc::new(definition.check.compile()?);
    let targets: Vec<TargetKey> = definition.targets.clone();
    let message = definition
        .message
        .clone()
        .unwrap_or_else(|| definition.check.default_message(&targets));

    let mut builder = RuleDescriptor::builder(definition.id.clone()).targets(targets.iter().cloned());
    if let Some(description) = &definition.description {
        builder = builder.description(description.clone());
    }

    let record = record.clone();
    match definition.latency_ms {
        None => builder.check(move || {
            RuleResult::ensure(compiled.passes(&record.values(&targets)), message.clone())
        }),
        Some(latency_ms) => builder.check_async(move || {
            let values = record.values(&targets);
            let compiled = Arc::clone(&compiled);
            let message = message.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                RuleResult::ensure(compiled.passes(&values), message)
            }
        }),
    }
}
