//! List command implementation
//!
//! This module implements the `verdict list` command, which:
//! - Lists every rule declared in a rule file, in registration order
//! - Shows rule ID, check kind, sync/async mode, targets and message
//! - Supports both human-readable and JSONL output formats

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS, is_parse_error, load_config, resolve_format};
use crate::error::ConfigError;
use crate::output::{RuleListing, RuleListingHumanFormatter, RuleListingJsonlFormatter};
use std::path::Path;

/// Run the list command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: Error
/// - 3: Parse error (malformed rule file)
pub fn run_list(rules: &Path, format: Option<OutputFormat>) -> i32 {
    match run_list_inner(rules, format) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: Configuration error: {}", e);
            if is_parse_error(&e) {
                EXIT_PARSE_ERROR
            } else {
                EXIT_ERROR
            }
        }
    }
}

/// Internal implementation of list command
fn run_list_inner(rules: &Path, format: Option<OutputFormat>) -> Result<(), ConfigError> {
    let config = load_config(rules)?;
    let format = resolve_format(format, config.output.format);

    let listings: Vec<RuleListing> = config.rules.iter().map(RuleListing::from_definition).collect();

    match format {
        OutputFormat::Human => {
            if listings.is_empty() {
                println!("No rules are declared.");
            } else {
                RuleListingHumanFormatter::new().write_to_stdout(&listings);
            }
        }
        OutputFormat::Jsonl => RuleListingJsonlFormatter::new().write_to_stdout(&listings),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let code = run_list(&temp_dir.path().join("missing.toml"), None);
        assert_eq!(code, EXIT_ERROR);
    }

    #[test]
    fn test_list_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("verdict.toml");
        std::fs::write(&path, "[verdict]\nversion = \"9\"\n").unwrap();
        assert_eq!(run_list(&path, None), EXIT_PARSE_ERROR);
    }

    #[test]
    fn test_list_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("verdict.toml");
        std::fs::write(
            &path,
            "[verdict]\nversion = \"1\"\n\n[[rules]]\nid = \"a\"\ntargets = [\"A\"]\ncheck = \"required\"\n",
        )
        .unwrap();
        assert_eq!(run_list(&path, Some(OutputFormat::Jsonl)), EXIT_SUCCESS);
    }
}
