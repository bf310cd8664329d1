//! Manual page catalog: entries, section filters and the page source contract.

pub mod system;

pub use system::SystemPages;

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single manual page known to the catalog.
///
/// Identity is `(name, section)`; the composite form `name(section)` doubles
/// as the document ID in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageEntry {
    pub name: String,
    pub section: String,
    pub description: String,
    /// Source file on disk. Keyword search results do not carry one.
    pub path: Option<PathBuf>,
}

impl PageEntry {
    pub fn new(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            description: String::new(),
            path: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Composite document ID, `name(section)`.
    pub fn doc_id(&self) -> String {
        format!("{}({})", self.name, self.section)
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.section)
    }

    /// Section category: the leading character of the section (`3p` -> `3`).
    pub fn category(&self) -> Option<char> {
        self.section.chars().next()
    }
}

impl fmt::Display for PageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.section)?;
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        Ok(())
    }
}

/// Everything the core needs from the system's manual page machinery.
pub trait PageSource: Send + Sync {
    /// All installed pages, deduplicated on `(name, section)` and sorted by name.
    fn list(&self) -> Result<Vec<PageEntry>>;

    /// Keyword search over names and descriptions. `"."` or empty lists everything.
    fn search(&self, query: &str) -> Result<Vec<PageEntry>>;

    /// Formatted, human-readable text of a page.
    fn content(&self, name: &str, section: Option<&str>) -> Result<String>;

    /// Raw page source, decompressed when the file carries a compressed suffix.
    fn raw_content(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Toggleable filter for one standard section category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFilter {
    pub code: char,
    pub label: &'static str,
    pub enabled: bool,
}

const STANDARD_SECTIONS: [(char, &str); 9] = [
    ('1', "General Commands"),
    ('2', "System Calls"),
    ('3', "Library Functions"),
    ('4', "Kernel Interfaces"),
    ('5', "File Formats"),
    ('6', "Games"),
    ('7', "Miscellaneous"),
    ('8', "System Manager's"),
    ('9', "Kernel Developer's"),
];

/// The nine standard categories, all enabled.
pub fn default_filters() -> Vec<SectionFilter> {
    STANDARD_SECTIONS
        .iter()
        .map(|&(code, label)| SectionFilter {
            code,
            label,
            enabled: true,
        })
        .collect()
}

/// Whether a page passes the filter set.
///
/// Pages whose category is not one of the standard codes cannot be toggled
/// off and always pass.
pub fn is_visible(page: &PageEntry, filters: &[SectionFilter]) -> bool {
    let Some(category) = page.category() else {
        return true;
    };
    filters
        .iter()
        .find(|f| f.code == category)
        .map(|f| f.enabled)
        .unwrap_or(true)
}

/// Catalog subsequence that passes the filters, in catalog order.
pub fn apply_filters(catalog: &[PageEntry], filters: &[SectionFilter]) -> Vec<PageEntry> {
    catalog
        .iter()
        .filter(|page| is_visible(page, filters))
        .cloned()
        .collect()
}

/// Split a composite `name(section)` ID back into its parts.
///
/// Splits at the first `(`; an ID without one is all name.
pub fn parse_doc_id(doc_id: &str) -> (String, String) {
    match doc_id.find('(') {
        Some(idx) => {
            let name = doc_id[..idx].to_string();
            let section = doc_id[idx + 1..].trim_end_matches(')').to_string();
            (name, section)
        }
        None => (doc_id.to_string(), String::new()),
    }
}
