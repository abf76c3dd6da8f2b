//! Styled terminal reporter.
//!
//! Informational lines go to stdout; warnings and errors to stderr so that
//! `cask resolve` and `cask import` output stays pipeable.

use std::path::Path;

use cask_core::Reporter;
use cask_schema::Identifier;
use crossterm::style::Stylize;

/// Reporter that prints to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    quiet: bool,
}

impl Output {
    /// Create a new output handle. `quiet` suppresses info and success lines.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print an aligned `label: value` row.
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", Self::row(label, value));
        }
    }

    /// Like [`Output::field`], but on stderr, for commands whose stdout is data.
    pub fn detail(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{}", Self::row(label, value));
        }
    }

    fn row(label: &str, value: impl std::fmt::Display) -> String {
        let label = format!("{label}:");
        format!("  {} {value}", format!("{label:<12}").dark_grey())
    }
}

impl Reporter for Output {
    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {msg}", "✓".green());
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("{} {msg}", "WARNING:".bold().yellow());
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "ERROR:".bold().red());
    }

    fn removing(&self, id: &Identifier, path: &Path, dry_run: bool) {
        if self.quiet {
            return;
        }
        let verb = if dry_run { "would remove" } else { "removed" };
        println!("  {} {verb} {}", id.as_str().cyan(), path.display());
    }
}
