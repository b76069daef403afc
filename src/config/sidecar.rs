//! Sidecar input files
//!
//! Optional plain-text files read from the working directory:
//! - `excluded_tables.txt`: comma-separated table names to leave out of the report
//! - `details.txt`: `key: value` lines for the project name, title and description
//!
//! Both files are optional. A missing file yields the defaults, an unreadable
//! one logs a warning and yields the defaults.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

/// File name of the exclusion list
pub const EXCLUDED_TABLES_FILE: &str = "excluded_tables.txt";

/// File name of the report details
pub const DETAILS_FILE: &str = "details.txt";

/// File name of the optional cover-page template
pub const COVER_TEMPLATE_FILE: &str = "model.docx";

pub const DEFAULT_PROJECT: &str = "Data Dictionary";
pub const DEFAULT_TITLE: &str = "Database Documentation";

/// Set of table names excluded from the diagram and the data dictionary
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    tables: BTreeSet<String>,
}

impl ExclusionList {
    /// Parse the comma-separated content of `excluded_tables.txt`
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let tables = content
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { tables }
    }

    /// Load the exclusion list from `path`, returning an empty list if the file is absent
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                tracing::info!(count = list.len(), "Loaded excluded tables");
                list
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Could not read excluded tables: {e}");
                Self::default()
            }
        }
    }

    /// Whether `table` is excluded
    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { tables: iter.into_iter().map(Into::into).collect() }
    }
}

/// Project name, title and description shown in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDetails {
    /// Project name (uppercased when read from `details.txt`)
    pub project: String,

    /// Cover-page title
    pub title: String,

    /// Cover-page description
    pub description: String,
}

impl Default for ReportDetails {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
        }
    }
}

impl ReportDetails {
    /// Parse `details.txt` content
    ///
    /// Keys are matched case-insensitively at the start of a line and the last
    /// occurrence of a key wins. Unrecognized lines are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut details = Self::default();

        for line in content.lines() {
            let lowered = line.to_lowercase();
            let value =
                || line.split_once(':').map(|(_, v)| v.trim().to_string()).unwrap_or_default();

            if lowered.starts_with("project:") {
                details.project = value().to_uppercase();
            } else if lowered.starts_with("title:") {
                details.title = value();
            } else if lowered.starts_with("description:") {
                details.description = value();
            }
        }

        details
    }

    /// Load details from `path`, falling back to defaults if absent or unreadable
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Could not read details file: {e}");
                Self::default()
            }
        }
    }
}
