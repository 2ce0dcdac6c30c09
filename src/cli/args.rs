//! CLI argument parsing using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for verdict commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// Verdict CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "verdict")]
#[command(about = "Declarative field validation with sync and async rules")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Output coloring (overrides the rule file's [output] color)
    #[arg(long, global = true)]
    pub color: Option<ColorChoice>,
}

/// Available verdict subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a record of field values against a rule file
    Check {
        /// Rule file
        #[arg(short, long, default_value = "verdict.toml")]
        rules: PathBuf,

        /// Field values (.toml or .json)
        #[arg(long)]
        values: PathBuf,

        /// Validate only these targets (repeatable; defaults to all)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Output format (overrides the rule file's [output] format)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// List the rules declared in a rule file
    List {
        /// Rule file
        #[arg(short, long, default_value = "verdict.toml")]
        rules: PathBuf,

        /// Output format (overrides the rule file's [output] format)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
}
