//! The placement engine: one pass over a source directory.
//!
//! [`organize`] walks the immediate entries of the source directory, applies
//! the exclusion and size filters, classifies each file by extension, and
//! moves (or copies) it into the matching category subfolder of the
//! destination. Every processed file produces one event on the injected
//! sink; the pass ends with an aggregate [`RunSummary`].

use crate::category::{CategoryTable, extension_of};
use crate::config::{CollisionMode, OperationMode, Policy};
use crate::events::{EventReason, EventSink, OpKind, OperationEvent};
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

/// Errors that abort a whole run before or during the scan.
///
/// Per-file failures are not errors; they become ERROR events and the run
/// continues with the next entry.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory does not exist; nothing was touched.
    SourceNotFound(PathBuf),
    /// The destination root or a category folder could not be created.
    DestinationUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The source directory listing could not be read.
    ScanFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(path) => {
                write!(f, "Source directory does not exist: {}", path.display())
            }
            Self::DestinationUnavailable { path, source } => {
                write!(
                    f,
                    "Failed to create destination directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::ScanFailed { path, source } => {
                write!(
                    f,
                    "Failed to read source directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for placement engine operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Aggregate counts for one run. Created zeroed, reported at run end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files moved or copied successfully.
    pub moved: usize,
    /// Files skipped (excluded, out of size bounds, no extension, collision).
    pub skipped: usize,
    /// Files whose move/copy failed.
    pub errors: usize,
}

impl RunSummary {
    /// Total number of files processed.
    pub fn total(&self) -> usize {
        self.moved + self.skipped + self.errors
    }
}

/// One discovered filesystem entry, consumed immediately after creation.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// The filename, without any directory component.
    pub name: String,
    /// Absolute source path.
    pub path: PathBuf,
    /// Normalized extension (e.g. ".pdf"), `None` when absent.
    pub extension: Option<String>,
    /// Size in bytes; `None` when the metadata could not be read.
    pub size: Option<u64>,
}

impl FileTask {
    fn from_entry(entry: &DirEntry) -> Self {
        let name = entry.file_name().to_string_lossy().to_string();
        Self {
            extension: extension_of(&name),
            size: entry.metadata().ok().map(|m| m.len()),
            path: entry.path(),
            name,
        }
    }
}

/// Runs one organization pass.
///
/// The category table and policy are borrowed read-only for the duration of
/// the run; events go to `sink` as they happen. Entries are processed in
/// whatever order the directory enumeration yields them.
///
/// # Errors
///
/// Fails with [`OrganizeError::SourceNotFound`] when the source directory is
/// absent, before any destination directory is created or any event is
/// emitted. Destination setup and scan failures abort the run likewise.
///
/// # Examples
///
/// ```no_run
/// use filebutler::category::CategoryTable;
/// use filebutler::config::Policy;
/// use filebutler::events::OperationEvent;
/// use filebutler::organizer::organize;
/// use std::path::Path;
///
/// let mut events: Vec<OperationEvent> = Vec::new();
/// let summary = organize(
///     Path::new("/home/user/Downloads"),
///     Path::new("/home/user/Sorted"),
///     &CategoryTable::default(),
///     &Policy::default(),
///     &mut events,
/// )?;
/// println!("moved {}, skipped {}", summary.moved, summary.skipped);
/// # Ok::<(), filebutler::organizer::OrganizeError>(())
/// ```
pub fn organize(
    source: &Path,
    dest: &Path,
    table: &CategoryTable,
    policy: &Policy,
    sink: &mut dyn EventSink,
) -> OrganizeResult<RunSummary> {
    if !source.is_dir() {
        return Err(OrganizeError::SourceNotFound(source.to_path_buf()));
    }

    if !policy.dry_run {
        ensure_category_dirs(dest, table)?;
    }

    let entries = fs::read_dir(source).map_err(|e| OrganizeError::ScanFailed {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut summary = RunSummary::default();

    for entry in entries.flatten() {
        // Subdirectories and other non-regular entries are neither recursed
        // into nor reported.
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let task = FileTask::from_entry(&entry);
        process_task(&task, dest, table, policy, sink, &mut summary);
    }

    Ok(summary)
}

/// Applies the filter-classify-place pipeline to one task.
fn process_task(
    task: &FileTask,
    dest: &Path,
    table: &CategoryTable,
    policy: &Policy,
    sink: &mut dyn EventSink,
    summary: &mut RunSummary,
) {
    if policy.is_excluded(&task.name) {
        emit_skip(sink, task, EventReason::Excluded, None);
        summary.skipped += 1;
        return;
    }

    if !policy.size_within(task.size) {
        emit_skip(sink, task, EventReason::SizeLimit, None);
        summary.skipped += 1;
        return;
    }

    let Some(extension) = task.extension.as_deref() else {
        emit_skip(sink, task, EventReason::NoExtension, None);
        summary.skipped += 1;
        return;
    };

    let category = table.classify(extension);
    let destination = dest.join(category).join(&task.name);

    if destination.exists() && policy.collision == CollisionMode::Skip {
        emit_skip(sink, task, EventReason::FileExists, Some(destination));
        summary.skipped += 1;
        return;
    }

    let kind = match policy.operation {
        OperationMode::Move => OpKind::Move,
        OperationMode::Copy => OpKind::Copy,
    };

    let outcome = if policy.dry_run {
        Ok(())
    } else {
        perform(policy.operation, &task.path, &destination)
    };

    match outcome {
        Ok(()) => {
            sink.record(&OperationEvent {
                kind,
                filename: task.name.clone(),
                source: task.path.clone(),
                destination: Some(destination),
                reason: EventReason::Success,
            });
            summary.moved += 1;
        }
        Err(e) => {
            sink.record(&OperationEvent {
                kind: OpKind::Error,
                filename: task.name.clone(),
                source: task.path.clone(),
                destination: Some(destination),
                reason: EventReason::Failure(e.to_string()),
            });
            summary.errors += 1;
        }
    }
}

fn emit_skip(
    sink: &mut dyn EventSink,
    task: &FileTask,
    reason: EventReason,
    destination: Option<PathBuf>,
) {
    sink.record(&OperationEvent {
        kind: OpKind::Skip,
        filename: task.name.clone(),
        source: task.path.clone(),
        destination,
        reason,
    });
}

/// Executes the configured filesystem operation for one file.
fn perform(operation: OperationMode, source: &Path, destination: &Path) -> std::io::Result<()> {
    match operation {
        OperationMode::Move => move_file(source, destination),
        OperationMode::Copy => fs::copy(source, destination).map(|_| ()),
    }
}

/// Moves a file, falling back to copy-then-remove when rename fails
/// (e.g. across filesystems).
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination)?;
    fs::remove_file(source)
}

/// Creates the destination root and one subfolder per category.
///
/// Creation is idempotent; pre-existing folders are left untouched.
fn ensure_category_dirs(dest: &Path, table: &CategoryTable) -> OrganizeResult<()> {
    for name in table.names() {
        let path = dest.join(name);
        fs::create_dir_all(&path).map_err(|e| OrganizeError::DestinationUnavailable {
            path,
            source: e,
        })?;
    }
    Ok(())
}
