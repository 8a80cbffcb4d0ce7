//! filebutler - sort files into category subfolders, once or on a schedule
//!
//! This library scans a source directory, classifies each regular file by
//! extension into a named category, and moves (or copies) it into the
//! matching subfolder of a destination directory. Exclusion rules, size
//! limits, collision policy, and run scheduling are all configurable via a
//! TOML file.

pub mod category;
pub mod cli;
pub mod config;
pub mod events;
pub mod organizer;
pub mod output;
pub mod scheduler;

pub use category::{CategoryRule, CategoryTable, FALLBACK_CATEGORY};
pub use config::{CollisionMode, ConfigError, OperationMode, Policy, Settings};
pub use events::{EventReason, EventSink, OpKind, OperationEvent};
pub use organizer::{OrganizeError, RunSummary, organize};
pub use scheduler::{Scheduler, Trigger};
