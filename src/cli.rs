//! CLI argument parsing and command dispatch

pub mod args;
pub mod check;
pub(crate) mod common;
pub mod list;

// Re-export types for convenient access
pub use args::{Cli, ColorChoice, Command, OutputFormat};

/// Run a parsed command line, returning the process exit code
pub fn run(cli: Cli) -> i32 {
    match cli.command {
        Command::Check {
            rules,
            values,
            targets,
            format,
        } => check::run_check(&rules, &values, &targets, format, cli.color),
        Command::List { rules, format } => list::run_list(&rules, format),
    }
}
