#![forbid(unsafe_code)]

//! Core domain types for Verdict
//!
//! This module defines the fundamental types used throughout the Verdict system:
//! identifiers for rules and targets, the outcome of a single rule, and the
//! combined per-target and whole-object snapshots produced by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A validated rule identifier
///
/// Rule IDs must be non-empty and contain only alphanumeric characters, hyphens, and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new RuleId, validating the input
    ///
    /// Returns None if the input is empty or contains invalid characters
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }
        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(RuleId(id))
    }

    /// Returns the rule ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RuleId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RuleId::new(value).ok_or_else(|| "Invalid rule ID".to_string())
    }
}

impl From<RuleId> for String {
    fn from(rule_id: RuleId) -> Self {
        rule_id.0
    }
}

/// Identifier of a validatable location, conventionally a property name
///
/// Keys compare by value; the engine never interprets their content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKey(String);

impl TargetKey {
    /// Creates a new TargetKey
    pub fn new(key: impl Into<String>) -> Self {
        TargetKey(key.into())
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TargetKey {
    fn from(key: String) -> Self {
        TargetKey(key)
    }
}

impl From<&str> for TargetKey {
    fn from(key: &str) -> Self {
        TargetKey(key.to_string())
    }
}

impl From<&TargetKey> for TargetKey {
    fn from(key: &TargetKey) -> Self {
        key.clone()
    }
}

/// Outcome of evaluating one rule
///
/// Combining results keeps every message in combination order:
///
/// ```
/// use verdict::RuleResult;
///
/// let combined = RuleResult::invalid("a")
///     .combine(RuleResult::Valid)
///     .combine(RuleResult::invalid("b"));
/// assert_eq!(combined, RuleResult::Invalid(vec!["a".into(), "b".into()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "messages", rename_all = "lowercase")]
pub enum RuleResult {
    #[default]
    Valid,
    /// Carries at least one message; an empty list is treated as `Valid`
    Invalid(Vec<String>),
}

impl RuleResult {
    /// An invalid result with a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        RuleResult::Invalid(vec![message.into()])
    }

    /// Builds a result from collected messages; no messages means `Valid`
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() {
            RuleResult::Valid
        } else {
            RuleResult::Invalid(messages)
        }
    }

    /// `Valid` when `condition` holds, otherwise `Invalid([message])`
    pub fn ensure(condition: bool, message: impl Into<String>) -> Self {
        if condition {
            RuleResult::Valid
        } else {
            RuleResult::invalid(message)
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            RuleResult::Valid => true,
            RuleResult::Invalid(messages) => messages.is_empty(),
        }
    }

    /// Messages carried by this result (empty when valid)
    pub fn messages(&self) -> &[String] {
        match self {
            RuleResult::Valid => &[],
            RuleResult::Invalid(messages) => messages,
        }
    }

    /// Combines two results, appending `other`'s messages after `self`'s
    pub fn combine(self, other: RuleResult) -> RuleResult {
        match (self, other) {
            (RuleResult::Valid, other) => other.normalized(),
            (this, RuleResult::Valid) => this.normalized(),
            (RuleResult::Invalid(mut first), RuleResult::Invalid(second)) => {
                first.extend(second);
                RuleResult::from_messages(first)
            }
        }
    }

    /// Collapses `Invalid([])` into `Valid`
    pub fn normalized(self) -> RuleResult {
        match self {
            RuleResult::Invalid(messages) if messages.is_empty() => RuleResult::Valid,
            other => other,
        }
    }
}

impl FromIterator<RuleResult> for RuleResult {
    fn from_iter<I: IntoIterator<Item = RuleResult>>(iter: I) -> Self {
        iter.into_iter().fold(RuleResult::Valid, RuleResult::combine)
    }
}

/// Combined outcome of every rule bound to one target
///
/// A target with an outstanding asynchronous rule is `pending`: any
/// synchronous failures are already listed in `errors`, but the target is not
/// reported valid until every rule has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl TargetResult {
    /// The result of a target with no rules: valid, no errors
    pub fn valid() -> Self {
        TargetResult {
            is_valid: true,
            errors: Vec::new(),
            pending: false,
        }
    }

    /// Builds a target result from its combined rule outcome
    pub fn from_rule_result(result: RuleResult, pending: bool) -> Self {
        let errors = match result.normalized() {
            RuleResult::Valid => Vec::new(),
            RuleResult::Invalid(messages) => messages,
        };
        TargetResult {
            is_valid: errors.is_empty() && !pending,
            errors,
            pending,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Default for TargetResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Snapshot of the validation state of a whole object
///
/// Only targets that have at least one registered (and evaluated) rule appear
/// in `targets`. Snapshots are immutable; the engine replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub targets: BTreeMap<TargetKey, TargetResult>,
}

impl ValidationResult {
    /// The all-valid snapshot with no targets
    pub fn empty() -> Self {
        ValidationResult {
            is_valid: true,
            targets: BTreeMap::new(),
        }
    }

    /// Builds a snapshot, deriving `is_valid` as the conjunction of all targets
    pub fn from_targets(targets: BTreeMap<TargetKey, TargetResult>) -> Self {
        let is_valid = targets.values().all(|target| target.is_valid);
        ValidationResult { is_valid, targets }
    }

    /// Result for one target; unknown targets are valid with no errors
    pub fn target(&self, key: &TargetKey) -> TargetResult {
        self.targets.get(key).cloned().unwrap_or_default()
    }

    /// Error messages for one target (empty for unknown targets)
    pub fn errors_for(&self, key: &TargetKey) -> &[String] {
        self.targets
            .get(key)
            .map(|target| target.errors.as_slice())
            .unwrap_or(&[])
    }

    /// True while any target still waits on an asynchronous rule
    pub fn is_pending(&self) -> bool {
        self.targets.values().any(|target| target.pending)
    }

    /// Number of targets currently reporting errors
    pub fn error_count(&self) -> usize {
        self.targets.values().filter(|t| t.has_errors()).count()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::empty()
    }
}
