//! Extension-based file categorization.
//!
//! This module maps file extensions to named categories (e.g. "Documents",
//! "Images") using an ordered table. Lookup is first-match-wins under table
//! order, and any extension that matches no category falls through to the
//! reserved "Others" category, which the table guarantees always exists.
//!
//! # Examples
//!
//! ```
//! use filebutler::category::CategoryTable;
//!
//! let table = CategoryTable::default();
//! assert_eq!(table.classify(".pdf"), "Documents");
//! assert_eq!(table.classify(".JPG"), "Images");
//! assert_eq!(table.classify(".xyz"), "Others");
//! ```

use std::collections::HashSet;

/// Name of the reserved fallback category.
pub const FALLBACK_CATEGORY: &str = "Others";

/// A single named category backed by a set of extensions.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// The category name, used as the destination subdirectory name.
    pub name: String,
    /// Dot-prefixed lowercase extensions belonging to this category.
    extensions: HashSet<String>,
}

impl CategoryRule {
    /// Creates a rule, normalizing extensions to dot-prefixed lowercase.
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| canonical_extension(e)).collect(),
        }
    }

    fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}

/// Errors raised while building a category table.
#[derive(Debug, Clone)]
pub enum CategoryTableError {
    /// The same category name appears more than once.
    DuplicateCategory(String),
}

impl std::fmt::Display for CategoryTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryTableError::DuplicateCategory(name) => {
                write!(f, "duplicate category name: {}", name)
            }
        }
    }
}

impl std::error::Error for CategoryTableError {}

/// Ordered mapping from category name to extension set.
///
/// Extensions may appear in more than one category; the first category in
/// table order wins. The fallback category is appended automatically when
/// the supplied rules do not define it.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<CategoryRule>,
}

impl CategoryTable {
    /// Builds a table from ordered rules.
    ///
    /// # Errors
    ///
    /// Returns `CategoryTableError::DuplicateCategory` when two rules share
    /// a name.
    pub fn from_rules(rules: Vec<CategoryRule>) -> Result<Self, CategoryTableError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.clone()) {
                return Err(CategoryTableError::DuplicateCategory(rule.name.clone()));
            }
        }

        let mut categories = rules;
        if !seen.contains(FALLBACK_CATEGORY) {
            categories.push(CategoryRule::new(FALLBACK_CATEGORY, &[]));
        }

        Ok(Self { categories })
    }

    /// Returns the category name for an extension.
    ///
    /// The input is normalized (lowercased, dot-prefixed) before lookup.
    /// Total over any string input; unmatched extensions, including the
    /// empty string, map to the fallback category.
    pub fn classify(&self, extension: &str) -> &str {
        let extension = canonical_extension(extension);
        self.categories
            .iter()
            .find(|rule| rule.contains(&extension))
            .map(|rule| rule.name.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Iterates category names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|rule| rule.name.as_str())
    }

    /// Returns the number of categories, fallback included.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if the table holds no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    /// The built-in taxonomy: Documents, Images, Spreadsheets,
    /// Presentations, Archives, Videos, Audio, Code, Others.
    fn default() -> Self {
        let rules = vec![
            CategoryRule::new(
                "Documents",
                &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt"],
            ),
            CategoryRule::new(
                "Images",
                &[
                    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp",
                ],
            ),
            CategoryRule::new("Spreadsheets", &[".xls", ".xlsx", ".csv", ".ods"]),
            CategoryRule::new("Presentations", &[".ppt", ".pptx", ".odp"]),
            CategoryRule::new("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"]),
            CategoryRule::new(
                "Videos",
                &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"],
            ),
            CategoryRule::new("Audio", &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma"]),
            CategoryRule::new(
                "Code",
                &[".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php"],
            ),
        ];

        Self::from_rules(rules).expect("built-in category names are unique")
    }
}

/// Normalizes an extension to dot-prefixed lowercase form.
///
/// Accepts both `"pdf"` and `".PDF"`; the empty string stays empty.
pub fn canonical_extension(extension: &str) -> String {
    let lowered = extension.to_lowercase();
    if lowered.is_empty() || lowered.starts_with('.') {
        lowered
    } else {
        format!(".{}", lowered)
    }
}

/// Extracts a filename's extension in canonical form.
///
/// Returns `None` for names without one; dotfiles such as `.gitignore`
/// count as extensionless.
///
/// # Examples
///
/// ```
/// use filebutler::category::extension_of;
///
/// assert_eq!(extension_of("report.PDF"), Some(".pdf".to_string()));
/// assert_eq!(extension_of("archive.tar.gz"), Some(".gz".to_string()));
/// assert_eq!(extension_of("notes"), None);
/// assert_eq!(extension_of(".gitignore"), None);
/// ```
pub fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| canonical_extension(&ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".pdf"), "Documents");
        assert_eq!(table.classify(".png"), "Images");
        assert_eq!(table.classify(".csv"), "Spreadsheets");
        assert_eq!(table.classify(".zip"), "Archives");
        assert_eq!(table.classify(".mp4"), "Videos");
        assert_eq!(table.classify(".mp3"), "Audio");
        assert_eq!(table.classify(".py"), "Code");
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".PDF"), "Documents");
        assert_eq!(table.classify(".Jpg"), "Images");
    }

    #[test]
    fn test_classify_accepts_undotted_input() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("pdf"), "Documents");
    }

    #[test]
    fn test_classify_unknown_falls_back_to_others() {
        let table = CategoryTable::default();
        assert_eq!(table.classify(".xyz"), FALLBACK_CATEGORY);
        assert_eq!(table.classify(""), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_fallback_category_always_present() {
        let table = CategoryTable::from_rules(vec![CategoryRule::new("Docs", &[".pdf"])])
            .expect("valid rules");
        assert!(table.names().any(|name| name == FALLBACK_CATEGORY));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_explicit_fallback_not_duplicated() {
        let table = CategoryTable::from_rules(vec![
            CategoryRule::new("Docs", &[".pdf"]),
            CategoryRule::new(FALLBACK_CATEGORY, &[]),
        ])
        .expect("valid rules");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let result = CategoryTable::from_rules(vec![
            CategoryRule::new("Docs", &[".pdf"]),
            CategoryRule::new("Docs", &[".txt"]),
        ]);
        assert!(matches!(
            result,
            Err(CategoryTableError::DuplicateCategory(name)) if name == "Docs"
        ));
    }

    #[test]
    fn test_first_match_wins_for_shared_extension() {
        let table = CategoryTable::from_rules(vec![
            CategoryRule::new("Scans", &[".pdf"]),
            CategoryRule::new("Documents", &[".pdf", ".txt"]),
        ])
        .expect("valid rules");
        assert_eq!(table.classify(".pdf"), "Scans");
        assert_eq!(table.classify(".txt"), "Documents");
    }

    #[test]
    fn test_canonical_extension() {
        assert_eq!(canonical_extension("PDF"), ".pdf");
        assert_eq!(canonical_extension(".TMP"), ".tmp");
        assert_eq!(canonical_extension(""), "");
    }

    #[test]
    fn test_extension_of_multiple_dots() {
        assert_eq!(extension_of("backup.2024.tar"), Some(".tar".to_string()));
    }
}
