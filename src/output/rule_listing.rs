#![forbid(unsafe_code)]

//! Rule listing formatters
//!
//! This module provides formatters for displaying the rules declared in a
//! rule file, as shown by the `verdict list` command. It supports both
//! human-readable and JSONL output formats.

use crate::config::RuleDefinition;
use crate::output::jsonl::push_line;
use serde::Serialize;

/// How a rule is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sync,
    Async,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sync => "sync",
            Mode::Async => "async",
        }
    }
}

/// Listing information for a single rule
#[derive(Debug, Clone)]
pub struct RuleListing {
    pub rule_id: String,
    pub description: String,
    pub check: String,
    pub targets: Vec<String>,
    pub message: String,
    pub mode: Mode,
}

impl RuleListing {
    pub fn from_definition(definition: &RuleDefinition) -> Self {
        let targets: Vec<String> = definition
            .targets
            .iter()
            .map(|target| target.as_str().to_string())
            .collect();
        let message = definition
            .message
            .clone()
            .unwrap_or_else(|| definition.check.default_message(&definition.targets));

        RuleListing {
            rule_id: definition.id.clone(),
            description: definition.description.clone().unwrap_or_default(),
            check: definition.check.kind().to_string(),
            targets,
            message,
            mode: if definition.latency_ms.is_some() {
                Mode::Async
            } else {
                Mode::Sync
            },
        }
    }
}

/// Human-readable formatter for rule listings
pub struct RuleListingHumanFormatter;

impl RuleListingHumanFormatter {
    pub fn new() -> Self {
        RuleListingHumanFormatter
    }

    /// Format a list of rules for human consumption
    pub fn format(&self, rules: &[RuleListing]) -> String {
        let mut output = String::new();

        output.push_str(&format!("Rules ({} declared):\n", rules.len()));
        output.push('\n');

        for rule in rules {
            output.push_str(&format!("{} ({}, {})\n", rule.rule_id, rule.check, rule.mode.as_str()));
            if !rule.description.is_empty() {
                output.push_str(&format!("  Description: {}\n", rule.description));
            }
            output.push_str(&format!("  Targets: {}\n", rule.targets.join(", ")));
            output.push_str(&format!("  Message: {}\n", rule.message));
            output.push('\n');
        }

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, rules: &[RuleListing]) {
        print!("{}", self.format(rules));
    }
}

impl Default for RuleListingHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// JSONL output structure for a rule listing
#[derive(Debug, Serialize)]
struct JsonlRule<'a> {
    rule_id: &'a str,
    check: &'a str,
    mode: &'static str,
    targets: &'a [String],
    message: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
}

/// JSONL formatter for rule listings
pub struct RuleListingJsonlFormatter;

impl RuleListingJsonlFormatter {
    pub fn new() -> Self {
        RuleListingJsonlFormatter
    }

    /// Format a list of rules as JSONL, one object per rule
    pub fn format(&self, rules: &[RuleListing]) -> String {
        let mut output = String::new();

        for rule in rules {
            let record = JsonlRule {
                rule_id: &rule.rule_id,
                check: &rule.check,
                mode: rule.mode.as_str(),
                targets: &rule.targets,
                message: &rule.message,
                description: &rule.description,
            };
            push_line(&mut output, &record);
        }

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, rules: &[RuleListing]) {
        print!("{}", self.format(rules));
    }
}

impl Default for RuleListingJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}
