use crate::error::Result;
use crate::index::engine::PageIndex;
use crate::index::types::SearchHit;
use crate::pages::{PageEntry, parse_doc_id};
use crate::query::excerpt::extract_excerpts;
use std::path::Path;

/// Maximum ranked hits taken from the engine per query
pub const MAX_HITS: usize = 100;

/// A deep-search hit ready for display
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub page: PageEntry,
    /// Context windows around matching lines, in line order
    pub excerpts: Vec<String>,
    pub score: f32,
    pub excerpt_count: usize,
    /// Engine snippet with matched terms wrapped in brackets
    pub highlight: String,
}

impl SearchResult {
    /// Build a result from a raw engine hit, scanning its content for `query`
    pub fn from_hit(hit: SearchHit, query: &str) -> Self {
        let (name, section) = parse_doc_id(&hit.doc_id);
        let mut page = PageEntry::new(name, section).with_description(hit.description);
        if let Some(path) = hit.path {
            page = page.with_path(path);
        }

        let excerpts = extract_excerpts(&hit.content, query);
        Self {
            page,
            excerpt_count: excerpts.len(),
            excerpts,
            score: hit.score,
            highlight: hit.highlight,
        }
    }
}

/// Run a full-text query against an open index
pub fn search_index(index: &PageIndex, query: &str) -> Result<Vec<SearchResult>> {
    let hits = index.query(query, MAX_HITS)?;
    tracing::debug!(query, hits = hits.len(), "Deep search");

    Ok(hits
        .into_iter()
        .map(|hit| SearchResult::from_hit(hit, query))
        .collect())
}

/// Open the index at `location` and query it.
///
/// A missing index fails with `IndexMissing` before any query runs.
pub fn search(location: &Path, query: &str) -> Result<Vec<SearchResult>> {
    let index = PageIndex::open(location)?;
    search_index(&index, query)
}
