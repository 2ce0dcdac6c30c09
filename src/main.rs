//! Verdict CLI entry point

use clap::Parser;
use std::process;
use verdict::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();
    verdict::logging::init();
    process::exit(cli::run(cli));
}
