//! Common helper functions shared across CLI commands
//!
//! This module provides shared functionality for loading rule files, choosing
//! output settings, and building engines from declarative rules.

use crate::cli::args::{ColorChoice, OutputFormat};
use crate::config::{ColorOption, Config};
use crate::engine::ValidationEngine;
use crate::error::{ConfigError, RuleError};
use crate::record::Record;
use crate::rules::builtin;
use std::io::IsTerminal;
use std::path::Path;

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Load a rule file
///
/// # Errors
///
/// Returns `ConfigError::Io` if the file does not exist or cannot be read.
/// Returns `ConfigError::InvalidSyntax` or `InvalidValue` if it is invalid.
pub(crate) fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("rule file {} not found", path.display()),
        )));
    }

    Config::load(path)
}

/// Build an engine registering every rule of `config`, in file order
///
/// # Errors
///
/// Returns `RuleError` if a rule cannot be built.
pub(crate) fn build_engine(config: &Config, record: &Record) -> Result<ValidationEngine, RuleError> {
    let engine = ValidationEngine::with_settings(config.engine.clone());
    for definition in &config.rules {
        engine.register(builtin::descriptor(definition, record)?);
    }
    Ok(engine)
}

/// Output format: the command-line flag wins over the rule file
pub(crate) fn resolve_format(
    flag: Option<OutputFormat>,
    config: crate::config::OutputFormat,
) -> OutputFormat {
    flag.unwrap_or(match config {
        crate::config::OutputFormat::Human => OutputFormat::Human,
        crate::config::OutputFormat::Jsonl => OutputFormat::Jsonl,
    })
}

/// Terminal color choice: the command-line flag wins over the rule file
///
/// `auto` only colors when stdout is a terminal.
pub(crate) fn resolve_color(flag: Option<ColorChoice>, config: ColorOption) -> termcolor::ColorChoice {
    let choice = flag.unwrap_or(match config {
        ColorOption::Auto => ColorChoice::Auto,
        ColorOption::Always => ColorChoice::Always,
        ColorOption::Never => ColorChoice::Never,
    });

    match choice {
        ColorChoice::Always => termcolor::ColorChoice::Always,
        ColorChoice::Never => termcolor::ColorChoice::Never,
        ColorChoice::Auto if std::io::stdout().is_terminal() => termcolor::ColorChoice::Auto,
        ColorChoice::Auto => termcolor::ColorChoice::Never,
    }
}

/// True for errors caused by malformed input files rather than I/O
pub(crate) fn is_parse_error(err: &ConfigError) -> bool {
    matches!(
        err,
        ConfigError::InvalidSyntax(_) | ConfigError::MissingField(_) | ConfigError::InvalidValue { .. }
    )
}
