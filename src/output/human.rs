#![forbid(unsafe_code)]

//! Human-readable output for `verdict check`
//!
//! One line per target with a ✓/✗ marker, the target's messages indented
//! below it, then a one-line summary.

use crate::output::Report;
use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Human-readable formatter
pub struct HumanFormatter {
    color: ColorChoice,
}

impl HumanFormatter {
    pub fn new(color: ColorChoice) -> Self {
        HumanFormatter { color }
    }

    /// Format a report as plain text, without color
    pub fn format(&self, report: &Report) -> String {
        let mut buffer = Buffer::no_color();
        // Writing to an in-memory buffer cannot fail
        let _ = self.write(&mut buffer, report);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    /// Write a report to stdout, colored according to the formatter's choice
    pub fn write_to_stdout(&self, report: &Report) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(self.color);
        self.write(&mut stdout, report)?;
        stdout.flush()
    }

    pub fn write<W: WriteColor>(&self, out: &mut W, report: &Report) -> io::Result<()> {
        if report.entries.is_empty() {
            writeln!(out, "No targets have rules.")?;
        }

        for (key, target) in &report.entries {
            let (icon, color) = if target.pending {
                ("…", Color::Yellow)
            } else if target.is_valid {
                ("✓", Color::Green)
            } else {
                ("✗", Color::Red)
            };

            out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            write!(out, "{}", icon)?;
            out.reset()?;
            write!(out, " {}", key)?;
            if target.pending {
                write!(out, " (pending)")?;
            }
            writeln!(out)?;

            for message in &target.errors {
                writeln!(out, "    {}", message)?;
            }
        }

        writeln!(out)?;
        if report.passed() {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "Validation PASSED")?;
            out.reset()?;
            writeln!(out, ": {} target(s) valid", report.entries.len())?;
        } else {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(out, "Validation FAILED")?;
            out.reset()?;
            writeln!(
                out,
                ": {} of {} target(s) invalid, {} error(s)",
                report.invalid_count(),
                report.entries.len(),
                report.error_count()
            )?;
        }

        Ok(())
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}
