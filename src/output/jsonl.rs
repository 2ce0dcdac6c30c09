#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. One target record per reported target (sorted by target key)
//! 2. One status record

use crate::output::Report;
use serde::Serialize;

/// JSONL output formatter
///
/// Formats validation reports as JSON Lines (one JSON object per line).
pub struct JsonlFormatter;

impl JsonlFormatter {
    /// Creates a new JsonlFormatter
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format a report as JSONL
    ///
    /// Returns a string with one JSON object per line:
    /// - First: All target records (sorted by key)
    /// - Finally: One status record
    pub fn format(&self, report: &Report) -> String {
        let mut output = String::new();

        for (key, target) in &report.entries {
            let record = TargetRecord {
                record_type: "target",
                target: key.as_str(),
                is_valid: target.is_valid,
                pending: target.pending,
                errors: &target.errors,
            };
            push_line(&mut output, &record);
        }

        let status = StatusRecord {
            record_type: "status",
            passed: report.passed(),
            targets_checked: report.entries.len() as u64,
            targets_invalid: report.invalid_count() as u64,
            total_errors: report.error_count() as u64,
        };
        push_line(&mut output, &status);

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, report: &Report) {
        print!("{}", self.format(report));
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn push_line<T: Serialize>(output: &mut String, record: &T) {
    match serde_json::to_string(record) {
        Ok(json) => {
            output.push_str(&json);
            output.push('\n');
        }
        Err(e) => tracing::error!(error = %e, "failed to serialize output record"),
    }
}

/// Target record for JSONL output
#[derive(Debug, Serialize)]
struct TargetRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    target: &'a str,
    is_valid: bool,
    pending: bool,
    errors: &'a [String],
}

/// Status record for JSONL output
#[derive(Debug, Serialize)]
struct StatusRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    passed: bool,
    targets_checked: u64,
    targets_invalid: u64,
    total_errors: u64,
}
