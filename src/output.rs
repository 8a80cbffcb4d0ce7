//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! messages, the per-file console event sink, progress tracking, and the
//! end-of-run summary table. This module abstracts away output details,
//! making it easy to change formatting globally.

use crate::events::{EventSink, OperationEvent, Severity};
use crate::organizer::RunSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for file operations.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the end-of-run summary counts.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filebutler::organizer::RunSummary;
    /// use filebutler::output::OutputFormatter;
    ///
    /// let summary = RunSummary { moved: 2, skipped: 1, errors: 0 };
    /// OutputFormatter::run_summary(&summary);
    /// ```
    pub fn run_summary(summary: &RunSummary) {
        Self::header("SUMMARY");
        println!("  Moved:   {}", summary.moved.to_string().green());
        println!("  Skipped: {}", summary.skipped.to_string().yellow());
        println!("  Errors:  {}", summary.errors.to_string().red());
        println!("  Total:   {}", summary.total().to_string().bold());
    }
}

/// Console event sink: one styled line per processed file.
///
/// With a progress bar attached, lines are routed through the bar so they
/// stay readable above it, and the bar advances once per event.
pub struct ConsoleSink {
    bar: Option<ProgressBar>,
}

impl ConsoleSink {
    /// A sink printing directly to stdout/stderr.
    pub fn new() -> Self {
        Self { bar: None }
    }

    /// A sink that also drives a progress bar over `total` files.
    pub fn with_progress(total: u64) -> Self {
        Self {
            bar: Some(OutputFormatter::create_progress_bar(total)),
        }
    }

    /// Finishes and clears the progress bar, if any.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    fn format_line(event: &OperationEvent) -> String {
        match event.severity() {
            Severity::Info => {
                let target = event
                    .destination
                    .as_ref()
                    .and_then(|p| p.parent())
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!(
                    "{} {} → {}/",
                    "✓".green(),
                    event.filename,
                    target
                )
            }
            Severity::Warning => format!(
                "{} {} skipped ({})",
                "⚠".yellow(),
                event.filename,
                event.reason
            ),
            Severity::Error => format!("{} {}: {}", "✗".red(), event.filename, event.reason),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        self.finish();
    }
}

impl EventSink for ConsoleSink {
    fn record(&mut self, event: &OperationEvent) {
        let line = Self::format_line(event);
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                bar.inc(1);
            }
            None => println!("{}", line),
        }
    }
}
