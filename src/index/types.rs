use crate::pages::PageEntry;
use crate::utils::AppConfig;
use std::path::PathBuf;

/// Unit written to the search index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub name: String,
    pub section: String,
    pub description: String,
    pub content: String,
    pub path: Option<PathBuf>,
}

impl IndexDocument {
    pub fn from_page(page: &PageEntry, content: String) -> Self {
        Self {
            name: page.name.clone(),
            section: page.section.clone(),
            description: page.description.clone(),
            content,
            path: page.path.clone(),
        }
    }

    /// Composite document ID, `name(section)`
    pub fn doc_id(&self) -> String {
        format!("{}({})", self.name, self.section)
    }
}

/// A ranked hit as returned by the engine
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f32,
    pub description: String,
    pub content: String,
    pub path: Option<PathBuf>,
    /// Highlighted content snippet, empty when the engine found no fragment
    pub highlight: String,
}

/// Tuning for an index rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub workers: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub progress_every: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl BuildOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            workers: config.effective_fetch_workers().max(1),
            batch_size: config.batch_size.max(1),
            queue_capacity: config.queue_capacity.max(1),
            progress_every: config.progress_every.max(1),
        }
    }
}

/// Counts reported by the indexing pipeline.
///
/// `processed - indexed` is the number of pages that could not be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub processed: usize,
}

impl IndexReport {
    pub fn failed(&self) -> usize {
        self.processed - self.indexed
    }
}

/// Progress snapshot emitted while indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub indexed: usize,
    pub total: usize,
}
