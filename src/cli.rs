//! Command-line interface module for filebutler.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing and validation
//! - Settings and policy loading
//! - One-shot organization orchestration
//! - Scheduled (watch) mode with interrupt handling
//! - Event sink composition (console, text log, JSON-lines log)

use crate::category::CategoryTable;
use crate::config::{Policy, Settings};
use crate::events::{EventSink, FanoutSink, FileLogSink, JsonlSink};
use crate::organizer::{OrganizeError, RunSummary, organize};
use crate::output::{ConsoleSink, OutputFormatter};
use crate::scheduler::{Scheduler, parse_daily_time};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// Sort files into category subfolders, once or on a schedule.
#[derive(Debug, Parser)]
#[command(name = "filebutler", version, about)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one organization pass over the source directory.
    Organize {
        /// Source directory to scan (overrides the config file).
        #[arg(long)]
        source: Option<PathBuf>,

        /// Destination root for category folders (overrides the config file).
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Report what would happen without touching any file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run organization passes on a schedule until interrupted.
    Watch {
        /// Source directory to scan (overrides the config file).
        #[arg(long)]
        source: Option<PathBuf>,

        /// Destination root for category folders (overrides the config file).
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Fire every N minutes (overrides the config file).
        #[arg(long, value_name = "MINUTES", conflicts_with = "daily")]
        every: Option<u64>,

        /// Fire once per day at HH:MM local time (overrides the config file).
        #[arg(long, value_name = "HH:MM")]
        daily: Option<String>,
    },
}

/// Everything one pass needs, resolved once from config and flags.
struct RunContext {
    source: PathBuf,
    dest: PathBuf,
    table: CategoryTable,
    policy: Policy,
    settings: Settings,
}

impl RunContext {
    fn build(
        settings: Settings,
        source: Option<PathBuf>,
        dest: Option<PathBuf>,
        dry_run: bool,
    ) -> Result<Self, String> {
        let source = source
            .or_else(|| settings.paths.source.clone())
            .ok_or_else(|| {
                "No source directory: pass --source or set [paths].source in the config".to_string()
            })?;
        let dest = dest
            .or_else(|| settings.paths.destination.clone())
            .ok_or_else(|| {
                "No destination directory: pass --dest or set [paths].destination in the config"
                    .to_string()
            })?;

        let table = settings
            .category_table()
            .map_err(|e| format!("Error loading categories: {}", e))?;
        let policy = settings
            .policy
            .compile()
            .map_err(|e| format!("Error compiling policy: {}", e))?
            .with_dry_run(dry_run);

        Ok(Self {
            source,
            dest,
            table,
            policy,
            settings,
        })
    }

    /// Builds the sinks for one pass: console plus the configured log file.
    ///
    /// A fresh log file is opened per pass, so scheduled runs each get
    /// their own.
    fn make_sink(&self, progress_total: Option<u64>) -> FanoutSink {
        let console = match progress_total {
            Some(total) => ConsoleSink::with_progress(total),
            None => ConsoleSink::new(),
        };
        let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(console)];

        if self.settings.log.enabled && !self.policy.dry_run {
            let directory = &self.settings.log.directory;
            if self.settings.log.json {
                match JsonlSink::create(directory) {
                    Ok(sink) => sinks.push(Box::new(sink)),
                    Err(e) => OutputFormatter::warning(&format!("Could not open event log: {}", e)),
                }
            } else {
                match FileLogSink::create(directory) {
                    Ok(sink) => sinks.push(Box::new(sink)),
                    Err(e) => OutputFormatter::warning(&format!("Could not open event log: {}", e)),
                }
            }
        }

        FanoutSink::new(sinks)
    }

    fn run_pass(&self, progress_total: Option<u64>) -> Result<RunSummary, OrganizeError> {
        let mut sink = self.make_sink(progress_total);
        organize(&self.source, &self.dest, &self.table, &self.policy, &mut sink)
    }
}

/// Parses arguments from the environment and runs the selected command.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();
    run_command(cli)
}

/// Runs an already-parsed CLI invocation. Split out for tests.
pub fn run_command(cli: Cli) -> Result<(), String> {
    let settings = Settings::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    match cli.command {
        Command::Organize {
            source,
            dest,
            dry_run,
        } => run_organize(settings, source, dest, dry_run),
        Command::Watch {
            source,
            dest,
            every,
            daily,
        } => run_watch(settings, source, dest, every, daily),
    }
}

fn run_organize(
    settings: Settings,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), String> {
    let context = RunContext::build(settings, source, dest, dry_run)?;

    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing {} → {}",
            context.source.display(),
            context.dest.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} → {}",
            context.source.display(),
            context.dest.display()
        ));
    }

    let progress_total = count_entries(&context.source);
    let summary = context
        .run_pass(progress_total)
        .map_err(|e| e.to_string())?;

    OutputFormatter::run_summary(&summary);
    if dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    }

    Ok(())
}

fn run_watch(
    settings: Settings,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    every: Option<u64>,
    daily: Option<String>,
) -> Result<(), String> {
    // Flags override the [schedule] section; a configured daily time wins
    // over the interval.
    let daily = daily.or_else(|| {
        if every.is_some() {
            None
        } else {
            settings.schedule.daily_time.clone()
        }
    });
    let interval = every.unwrap_or(settings.schedule.interval_minutes);

    let context = RunContext::build(settings, source, dest, false)?;
    let mut scheduler = Scheduler::new(move || context.run_pass(None));

    match daily {
        Some(time) => {
            let at = parse_daily_time(&time).map_err(|e| e.to_string())?;
            scheduler.configure_daily(at);
            OutputFormatter::info(&format!("Schedule: daily at {}", time));
        }
        None => {
            if interval == 0 {
                return Err(
                    "Scheduler disabled: set --every, --daily, or [schedule] in the config"
                        .to_string(),
                );
            }
            scheduler.configure_interval(interval);
            OutputFormatter::info(&format!("Schedule: every {} minutes", interval));
        }
    }

    let stop = scheduler.stop_handle();
    ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
        .map_err(|e| format!("Error installing interrupt handler: {}", e))?;

    OutputFormatter::info("Scheduler running. Press Ctrl+C to stop.");
    scheduler.start();
    OutputFormatter::info("Scheduler stopped.");

    Ok(())
}

/// Counts immediate entries for progress sizing; None when unreadable
/// (the engine reports the real error).
fn count_entries(source: &Path) -> Option<u64> {
    fs::read_dir(source).ok().map(|it| it.count() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize_flags() {
        let cli = Cli::parse_from([
            "filebutler",
            "organize",
            "--source",
            "/a",
            "--dest",
            "/b",
            "--dry-run",
        ]);
        match cli.command {
            Command::Organize {
                source,
                dest,
                dry_run,
            } => {
                assert_eq!(source, Some(PathBuf::from("/a")));
                assert_eq!(dest, Some(PathBuf::from("/b")));
                assert!(dry_run);
            }
            _ => panic!("expected organize command"),
        }
    }

    #[test]
    fn test_parse_watch_rejects_every_with_daily() {
        let result = Cli::try_parse_from([
            "filebutler",
            "watch",
            "--every",
            "10",
            "--daily",
            "09:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_context_requires_source() {
        let result = RunContext::build(Settings::default(), None, Some(PathBuf::from("/b")), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_organize_command_end_to_end() {
        let temp = TempDir::new().expect("temp dir");
        let source = temp.path().join("inbox");
        let dest = temp.path().join("sorted");
        fs::create_dir(&source).expect("create source");
        fs::write(source.join("report.pdf"), b"pdf").expect("write file");

        let mut settings = Settings::default();
        settings.log.enabled = false;

        run_organize(settings, Some(source.clone()), Some(dest.clone()), false)
            .expect("organize succeeds");

        assert!(dest.join("Documents").join("report.pdf").exists());
        assert!(!source.join("report.pdf").exists());
    }

    #[test]
    fn test_organize_command_missing_source_fails() {
        let temp = TempDir::new().expect("temp dir");
        let mut settings = Settings::default();
        settings.log.enabled = false;

        let result = run_organize(
            settings,
            Some(temp.path().join("absent")),
            Some(temp.path().join("sorted")),
            false,
        );
        assert!(result.is_err());
    }
}
