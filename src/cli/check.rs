//! Check command implementation
//!
//! This module implements the `verdict check` command, which:
//! - Loads rules from a rule file and values from a record file
//! - Registers every rule with a fresh engine
//! - Validates all targets, or only the requested ones
//! - Waits for asynchronous rules to settle
//! - Formats output (human or JSONL)
//! - Returns appropriate exit code

use crate::cli::args::{ColorChoice, OutputFormat};
use crate::cli::common::{
    EXIT_ERROR, EXIT_INVALID, EXIT_PARSE_ERROR, EXIT_SUCCESS, build_engine, is_parse_error,
    load_config, resolve_color, resolve_format,
};
use crate::engine::ValidationEngine;
use crate::error::{ConfigError, RuleError};
use crate::output::{HumanFormatter, JsonlFormatter, Report};
use crate::record::Record;
use crate::types::TargetKey;
use std::path::Path;

/// Error type specific to check command
#[derive(Debug, thiserror::Error)]
pub(crate) enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Values error in {file}: {source}")]
    Values {
        file: String,
        #[source]
        source: ConfigError,
    },

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    fn exit_code(&self) -> i32 {
        match self {
            CheckError::Config(e) | CheckError::Values { source: e, .. } if is_parse_error(e) => {
                EXIT_PARSE_ERROR
            }
            _ => EXIT_ERROR,
        }
    }
}

/// Run the check command
///
/// # Arguments
///
/// * `rules` - Rule file
/// * `values` - Field values (.toml or .json)
/// * `targets` - Targets to validate; all targets when empty
/// * `format` - Output format flag, if given
/// * `color` - Color flag, if given
///
/// # Returns
///
/// Exit code:
/// - 0: Success (every reported target is valid)
/// - 1: Invalid (one or more targets have errors)
/// - 2: Error (I/O or rule construction error)
/// - 3: Parse error (malformed rule or values file)
pub fn run_check(
    rules: &Path,
    values: &Path,
    targets: &[String],
    format: Option<OutputFormat>,
    color: Option<ColorChoice>,
) -> i32 {
    match run_check_inner(rules, values, targets, format, color) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_INVALID,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Internal implementation of check command
fn run_check_inner(
    rules: &Path,
    values: &Path,
    targets: &[String],
    format: Option<OutputFormat>,
    color: Option<ColorChoice>,
) -> Result<bool, CheckError> {
    let config = load_config(rules)?;
    let record = Record::load(values).map_err(|source| CheckError::Values {
        file: values.display().to_string(),
        source,
    })?;
    let format = resolve_format(format, config.output.format);

    let engine = build_engine(&config, &record)?;
    if engine.rule_count() == 0 {
        eprintln!("Warning: No rules are declared. Nothing to check.");
        return Ok(true);
    }

    let selected: Vec<TargetKey> = targets.iter().map(TargetKey::new).collect();
    let known = engine.targets();
    for key in &selected {
        if !known.contains(key) {
            eprintln!("Warning: no rules target '{}'", key);
        }
    }

    if format == OutputFormat::Human {
        eprintln!(
            "Validating {} with {} rules...",
            if selected.is_empty() {
                format!("{} targets", known.len())
            } else {
                format!("{} of {} targets", selected.len(), known.len())
            },
            engine.rule_count()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(validate(&engine, &selected));

    let report = Report::new(&engine.result(), &selected);
    match format {
        OutputFormat::Human => {
            eprintln!();
            HumanFormatter::new(resolve_color(color, config.output.color))
                .write_to_stdout(&report)?;
        }
        OutputFormat::Jsonl => JsonlFormatter::new().write_to_stdout(&report),
    }

    Ok(report.passed())
}

/// Validate the selected targets concurrently, or everything
async fn validate(engine: &ValidationEngine, selected: &[TargetKey]) {
    if selected.is_empty() {
        engine.validate_all().await;
    } else {
        futures::future::join_all(
            selected
                .iter()
                .map(|key| engine.validate_target(key.clone())),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_SUCCESS, 0);
        assert_eq!(EXIT_INVALID, 1);
        assert_eq!(EXIT_ERROR, 2);
        assert_eq!(EXIT_PARSE_ERROR, 3);
    }

    #[test]
    fn test_check_error_exit_codes() {
        let parse = CheckError::Config(ConfigError::InvalidSyntax("bad".to_string()));
        assert_eq!(parse.exit_code(), EXIT_PARSE_ERROR);

        let values = CheckError::Values {
            file: "form.toml".to_string(),
            source: ConfigError::InvalidSyntax("bad".to_string()),
        };
        assert_eq!(values.exit_code(), EXIT_PARSE_ERROR);
        assert!(values.to_string().contains("form.toml"));

        let io = CheckError::Io(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), EXIT_ERROR);

        let rule = CheckError::Rule(RuleError::InvalidRegex("(".to_string()));
        assert_eq!(rule.exit_code(), EXIT_ERROR);
    }
}
