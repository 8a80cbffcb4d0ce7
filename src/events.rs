//! Structured operation events and the sinks that record them.
//!
//! The placement engine never formats human-readable text itself; it emits
//! one [`OperationEvent`] per processed file into an injected [`EventSink`].
//! This module provides the event types plus file-backed sinks: a plain text
//! log (one timestamped line per event) and a JSON-lines log. The colored
//! console sink lives in [`crate::output`].

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The operation performed (or attempted) on one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    Move,
    Copy,
    Skip,
    Error,
}

impl OpKind {
    /// Upper-case wire name, as written to log files.
    pub fn code(&self) -> &'static str {
        match self {
            OpKind::Move => "MOVE",
            OpKind::Copy => "COPY",
            OpKind::Skip => "SKIP",
            OpKind::Error => "ERROR",
        }
    }
}

/// Why a file ended up with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventReason {
    Success,
    Excluded,
    SizeLimit,
    NoExtension,
    FileExists,
    /// Free-text detail of an I/O failure.
    Failure(String),
}

impl EventReason {
    /// Short status code; failures carry their detail text separately.
    pub fn code(&self) -> &'static str {
        match self {
            EventReason::Success => "SUCCESS",
            EventReason::Excluded => "EXCLUDED",
            EventReason::SizeLimit => "SIZE_LIMIT",
            EventReason::NoExtension => "NO_EXTENSION",
            EventReason::FileExists => "FILE_EXISTS",
            EventReason::Failure(_) => "FAILURE",
        }
    }
}

impl std::fmt::Display for EventReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventReason::Failure(detail) => write!(f, "{}", detail),
            other => write!(f, "{}", other.code()),
        }
    }
}

/// Severity class for downstream routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// Record of the outcome of processing one file.
///
/// Emitted once per discovered entry and never retained by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct OperationEvent {
    pub kind: OpKind,
    pub filename: String,
    pub source: PathBuf,
    /// Absent when no destination applies (exclusions, scan-time skips).
    pub destination: Option<PathBuf>,
    pub reason: EventReason,
}

impl OperationEvent {
    /// Routes the event to a severity class: successes are informational,
    /// skips are warnings, failures are errors.
    pub fn severity(&self) -> Severity {
        match (&self.kind, &self.reason) {
            (_, EventReason::Success) => Severity::Info,
            (OpKind::Skip, _) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// One-line log form: `MOVE | report.pdf | /src/report.pdf → /dst/Documents/report.pdf | SUCCESS`.
    pub fn log_line(&self) -> String {
        let destination = self
            .destination
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "{} | {} | {} → {} | {}",
            self.kind.code(),
            self.filename,
            self.source.display(),
            destination,
            self.reason
        )
    }
}

/// Receives operation events emitted by the placement engine.
pub trait EventSink {
    fn record(&mut self, event: &OperationEvent);
}

/// Collecting sink for tests and in-memory inspection.
impl EventSink for Vec<OperationEvent> {
    fn record(&mut self, event: &OperationEvent) {
        self.push(event.clone());
    }
}

/// Fans events out to several sinks in order.
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn record(&mut self, event: &OperationEvent) {
        for sink in &mut self.sinks {
            sink.record(event);
        }
    }
}

fn timestamped_log_path(directory: &Path, extension: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    directory.join(format!("filebutler_{}.{}", stamp, extension))
}

/// Plain text log sink writing one timestamped line per event.
///
/// A fresh log file is created per run, named after the start time, e.g.
/// `logs/filebutler_20260829_090000.log`.
pub struct FileLogSink {
    writer: BufWriter<File>,
    pub path: PathBuf,
}

impl FileLogSink {
    /// Creates the log directory if needed and opens a new log file.
    pub fn create(directory: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(directory)?;
        let path = timestamped_log_path(directory, "log");
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { writer, path })
    }
}

impl EventSink for FileLogSink {
    fn record(&mut self, event: &OperationEvent) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        // A log line that cannot be written is dropped; logging never fails a run.
        let _ = writeln!(
            self.writer,
            "{} | {} | {}",
            stamp,
            event.severity().label(),
            event.log_line()
        );
    }
}

impl Drop for FileLogSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// JSON-lines sink: one serialized [`OperationEvent`] object per line.
pub struct JsonlSink {
    writer: BufWriter<File>,
    pub path: PathBuf,
}

impl JsonlSink {
    /// Creates the log directory if needed and opens a new `.jsonl` file.
    pub fn create(directory: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(directory)?;
        let path = timestamped_log_path(directory, "jsonl");
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { writer, path })
    }
}

impl EventSink for JsonlSink {
    fn record(&mut self, event: &OperationEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(self.writer, "{}", line);
        }
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
