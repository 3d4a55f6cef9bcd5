//! CLI command definitions and user-facing notices.
//!
//! Uses clap derive macros for ergonomic argument definitions. Notices
//! go to stderr so they never mix with the report on stdout.

pub mod args;

use colored::Colorize;
use std::io::Write;

/// Print a dimmed informational notice to stderr.
pub fn print_notice(message: &str) {
    let mut handle = std::io::stderr().lock();
    let _ = writeln!(handle, "{}", message.dimmed());
    let _ = handle.flush();
}

/// Announce that the output is a dry run, not a review.
pub fn print_dry_run_banner(model: &str) {
    let mut handle = std::io::stderr().lock();
    let _ = writeln!(
        handle,
        "{} {}",
        "dry run".yellow().bold(),
        format!("· nothing was sent to {model}").dimmed()
    );
    let _ = handle.flush();
}
