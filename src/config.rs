//! Settings loading and run policy.
//!
//! This module loads the TOML configuration file and compiles its `[policy]`
//! section into an immutable [`Policy`] snapshot that the placement engine
//! reads for the duration of one run. Exclusion rules support:
//! - File extension matching (the primary rule)
//! - Exact filename matching
//! - Glob pattern matching
//! - Regex pattern matching
//!
//! # Configuration File Format
//!
//! ```toml
//! [paths]
//! source = "/home/user/Downloads"
//! destination = "/home/user/Sorted"
//!
//! [[categories]]
//! name = "Documents"
//! extensions = [".pdf", ".doc", ".txt"]
//!
//! [policy]
//! move_files = true
//! skip_existing = true
//! min_size_mb = 0
//! max_size_mb = 0
//! excluded_extensions = [".temp", ".tmp", ".log", ".cache"]
//!
//! [schedule]
//! interval_minutes = 30
//!
//! [log]
//! enabled = true
//! directory = "logs"
//! ```

use crate::category::{
    CategoryRule, CategoryTable, CategoryTableError, canonical_extension, extension_of,
};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Errors that can occur during configuration loading and policy compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// Invalid daily schedule time (expected "HH:MM").
    InvalidDailyTime(String),
    /// Invalid category table (e.g. duplicate names).
    InvalidCategories(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidDailyTime(value) => {
                write!(f, "Invalid daily time '{}': expected HH:MM", value)
            }
            ConfigError::InvalidCategories(reason) => {
                write!(f, "Invalid category table: {}", reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CategoryTableError> for ConfigError {
    fn from(err: CategoryTableError) -> Self {
        ConfigError::InvalidCategories(err.to_string())
    }
}

/// Top-level configuration, deserialized from TOML.
///
/// Every section defaults independently, so a partial (or absent) file is
/// always valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Default source and destination directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Ordered category rules; empty means the built-in table.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,

    /// Filtering and operation policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Run scheduling.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Operation event logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Default source and destination directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Raw `[policy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// true = move files, false = copy them.
    #[serde(default = "default_true")]
    pub move_files: bool,

    /// true = skip on collision, false = overwrite the destination.
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Reserved: accepted but not acted on. Date-named subfolders may use
    /// this in a later version.
    #[serde(default)]
    pub create_date_folders: bool,

    /// Minimum file size in MB; 0 = unbounded.
    #[serde(default)]
    pub min_size_mb: u64,

    /// Maximum file size in MB; 0 = unbounded.
    #[serde(default)]
    pub max_size_mb: u64,

    /// Extensions to exclude (e.g. ".tmp", ".log").
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Exact filenames to exclude (e.g. "Thumbs.db").
    #[serde(default)]
    pub excluded_filenames: Vec<String>,

    /// Glob patterns to exclude (e.g. "*.partial").
    #[serde(default)]
    pub excluded_patterns: Vec<String>,

    /// Regex patterns to exclude (for advanced users).
    #[serde(default)]
    pub excluded_regex: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_excluded_extensions() -> Vec<String> {
    vec![
        ".temp".to_string(),
        ".tmp".to_string(),
        ".log".to_string(),
        ".cache".to_string(),
    ]
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            move_files: true,
            skip_existing: true,
            create_date_folders: false,
            min_size_mb: 0,
            max_size_mb: 0,
            excluded_extensions: default_excluded_extensions(),
            excluded_filenames: Vec::new(),
            excluded_patterns: Vec::new(),
            excluded_regex: Vec::new(),
        }
    }
}

/// Raw `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Recurring interval in minutes; 0 disables the interval trigger.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Daily wall-clock time "HH:MM"; when set, wins over the interval.
    #[serde(default)]
    pub daily_time: Option<String>,
}

fn default_interval_minutes() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            daily_time: None,
        }
    }
}

/// Raw `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for per-run log files, created on first use.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// true = JSON-lines event log, false = plain text.
    #[serde(default)]
    pub json: bool,
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_log_directory(),
            json: false,
        }
    }
}

impl Settings {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `filebutler.toml` in the current directory
    /// 3. Look for `~/.config/filebutler/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from("filebutler.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filebutler")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table from the `[[categories]]` entries, or the
    /// built-in table when none are configured.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        if self.categories.is_empty() {
            return Ok(CategoryTable::default());
        }

        let rules = self
            .categories
            .iter()
            .map(|c| {
                let extensions: Vec<&str> = c.extensions.iter().map(String::as_str).collect();
                CategoryRule::new(&c.name, &extensions)
            })
            .collect();

        Ok(CategoryTable::from_rules(rules)?)
    }
}

/// Whether files are moved or copied into their category folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Move,
    Copy,
}

/// What to do when the destination path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    Skip,
    Overwrite,
}

/// Compiled, immutable policy snapshot for one run.
///
/// Glob and regex patterns are validated and compiled once here so that
/// per-file matching never reparses them. The snapshot is passed by shared
/// reference into the placement engine and never mutated mid-run.
pub struct Policy {
    pub operation: OperationMode,
    pub collision: CollisionMode,
    /// When set, the engine reports what it would do without touching the
    /// filesystem.
    pub dry_run: bool,
    min_size_bytes: u64,
    max_size_bytes: u64,
    excluded_extensions: HashSet<String>,
    excluded_filenames: HashSet<String>,
    excluded_patterns: Vec<Pattern>,
    excluded_regexes: Vec<Regex>,
}

impl PolicyConfig {
    /// Compile the raw policy section into an immutable [`Policy`].
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn compile(&self) -> Result<Policy, ConfigError> {
        let excluded_patterns = self
            .excluded_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let excluded_regexes = self
            .excluded_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Policy {
            operation: if self.move_files {
                OperationMode::Move
            } else {
                OperationMode::Copy
            },
            collision: if self.skip_existing {
                CollisionMode::Skip
            } else {
                CollisionMode::Overwrite
            },
            dry_run: false,
            min_size_bytes: self.min_size_mb * BYTES_PER_MB,
            max_size_bytes: self.max_size_mb * BYTES_PER_MB,
            excluded_extensions: self
                .excluded_extensions
                .iter()
                .map(|ext| canonical_extension(ext))
                .collect(),
            excluded_filenames: self.excluded_filenames.iter().cloned().collect(),
            excluded_patterns,
            excluded_regexes,
        })
    }
}

impl Policy {
    /// Check whether a filename is excluded from organization.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Exact filename match
    /// 2. File extension match (files with no extension never match here)
    /// 3. Glob pattern match
    /// 4. Regex pattern match
    pub fn is_excluded(&self, filename: &str) -> bool {
        if self.excluded_filenames.contains(filename) {
            return true;
        }

        if let Some(ext) = extension_of(filename)
            && self.excluded_extensions.contains(&ext)
        {
            return true;
        }

        if self
            .excluded_patterns
            .iter()
            .any(|pattern| pattern.matches(filename))
        {
            return true;
        }

        self.excluded_regexes
            .iter()
            .any(|regex| regex.is_match(filename))
    }

    /// Check whether a file size falls within the configured bounds.
    ///
    /// Both bounds zero means no limit. An unknown size (`None`, i.e. the
    /// metadata could not be read) is accepted rather than excluded, so an
    /// unreadable file is never silently stranded in the source directory.
    pub fn size_within(&self, size: Option<u64>) -> bool {
        if self.min_size_bytes == 0 && self.max_size_bytes == 0 {
            return true;
        }

        let Some(size) = size else {
            return true;
        };

        if self.min_size_bytes > 0 && size < self.min_size_bytes {
            return false;
        }
        if self.max_size_bytes > 0 && size > self.max_size_bytes {
            return false;
        }
        true
    }

    /// Returns a copy of this policy with the dry-run flag set.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for Policy {
    fn default() -> Self {
        PolicyConfig::default()
            .compile()
            .expect("default policy has no patterns to reject")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(config: PolicyConfig) -> Policy {
        config.compile().expect("policy should compile")
    }

    #[test]
    fn test_default_settings_parse_empty_file() {
        let settings: Settings = toml::from_str("").expect("empty config is valid");
        assert!(settings.policy.move_files);
        assert!(settings.policy.skip_existing);
        assert_eq!(settings.schedule.interval_minutes, 30);
        assert!(settings.log.enabled);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).expect("serialize");
        let parsed: Settings = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.policy.min_size_mb, settings.policy.min_size_mb);
        assert_eq!(parsed.log.directory, settings.log.directory);
    }

    #[test]
    fn test_settings_category_table() {
        let text = r#"
            [[categories]]
            name = "Scans"
            extensions = [".pdf"]

            [[categories]]
            name = "Text"
            extensions = [".txt"]
        "#;
        let settings: Settings = toml::from_str(text).expect("parse");
        let table = settings.category_table().expect("valid table");
        assert_eq!(table.classify(".pdf"), "Scans");
        assert_eq!(table.classify(".txt"), "Text");
        assert_eq!(table.classify(".zip"), "Others");
    }

    #[test]
    fn test_empty_categories_use_builtin_table() {
        let settings = Settings::default();
        let table = settings.category_table().expect("valid table");
        assert_eq!(table.classify(".pdf"), "Documents");
    }

    #[test]
    fn test_duplicate_categories_rejected() {
        let text = r#"
            [[categories]]
            name = "Docs"

            [[categories]]
            name = "Docs"
        "#;
        let settings: Settings = toml::from_str(text).expect("parse");
        assert!(matches!(
            settings.category_table(),
            Err(ConfigError::InvalidCategories(_))
        ));
    }

    #[test]
    fn test_excluded_extension_case_insensitive() {
        let policy = compile(PolicyConfig::default());
        assert!(policy.is_excluded("junk.tmp"));
        assert!(policy.is_excluded("junk.TMP"));
        assert!(policy.is_excluded("debug.log"));
        assert!(!policy.is_excluded("report.pdf"));
    }

    #[test]
    fn test_files_without_extension_never_excluded_by_extension() {
        let policy = compile(PolicyConfig::default());
        assert!(!policy.is_excluded("notes"));
        assert!(!policy.is_excluded(".gitignore"));
    }

    #[test]
    fn test_excluded_exact_filename() {
        let config = PolicyConfig {
            excluded_filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        };
        let policy = compile(config);
        assert!(policy.is_excluded("Thumbs.db"));
        assert!(!policy.is_excluded("image.jpg"));
    }

    #[test]
    fn test_excluded_glob_pattern() {
        let config = PolicyConfig {
            excluded_patterns: vec!["*.partial".to_string()],
            ..Default::default()
        };
        let policy = compile(config);
        assert!(policy.is_excluded("download.partial"));
        assert!(!policy.is_excluded("download.pdf"));
    }

    #[test]
    fn test_excluded_regex_pattern() {
        let config = PolicyConfig {
            excluded_regex: vec![r"^~\$".to_string()],
            ..Default::default()
        };
        let policy = compile(config);
        assert!(policy.is_excluded("~$report.docx"));
        assert!(!policy.is_excluded("report.docx"));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let config = PolicyConfig {
            excluded_patterns: vec!["[invalid".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_invalid_regex_pattern_returns_error() {
        let config = PolicyConfig {
            excluded_regex: vec!["[invalid(".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_size_unbounded_when_both_limits_zero() {
        let policy = compile(PolicyConfig::default());
        assert!(policy.size_within(Some(0)));
        assert!(policy.size_within(Some(u64::MAX)));
        assert!(policy.size_within(None));
    }

    #[test]
    fn test_size_bounds_in_megabytes() {
        let config = PolicyConfig {
            min_size_mb: 1,
            max_size_mb: 2,
            ..Default::default()
        };
        let policy = compile(config);
        assert!(!policy.size_within(Some(BYTES_PER_MB - 1)));
        assert!(policy.size_within(Some(BYTES_PER_MB)));
        assert!(policy.size_within(Some(2 * BYTES_PER_MB)));
        assert!(!policy.size_within(Some(2 * BYTES_PER_MB + 1)));
    }

    #[test]
    fn test_min_only_bound() {
        let config = PolicyConfig {
            min_size_mb: 1,
            ..Default::default()
        };
        let policy = compile(config);
        assert!(!policy.size_within(Some(10)));
        assert!(policy.size_within(Some(5 * BYTES_PER_MB)));
    }

    #[test]
    fn test_unknown_size_fails_open_with_limits_set() {
        let config = PolicyConfig {
            min_size_mb: 1,
            max_size_mb: 2,
            ..Default::default()
        };
        let policy = compile(config);
        assert!(policy.size_within(None));
    }

    #[test]
    fn test_operation_and_collision_modes() {
        let config = PolicyConfig {
            move_files: false,
            skip_existing: false,
            ..Default::default()
        };
        let policy = compile(config);
        assert_eq!(policy.operation, OperationMode::Copy);
        assert_eq!(policy.collision, CollisionMode::Overwrite);

        let policy = compile(PolicyConfig::default());
        assert_eq!(policy.operation, OperationMode::Move);
        assert_eq!(policy.collision, CollisionMode::Skip);
    }
}
