//! Error types shared by the page source, the index and the navigation core.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// Listing or content retrieval failed in the page source.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The formatter has no page for this name/section.
    #[error("no manual entry for {0}")]
    NotFound(String),

    /// A single page could not be read while indexing.
    #[error("failed to fetch {id}: {source}")]
    DocumentFetch {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create index at {}: {message}", path.display())]
    IndexCreate { path: PathBuf, message: String },

    #[error("search index not found at {}; run `mandex index` to build it", path.display())]
    IndexMissing { path: PathBuf },

    #[error("failed to open index at {}: {message}", path.display())]
    IndexOpen { path: PathBuf, message: String },

    #[error("failed to write to index: {0}")]
    IndexWrite(String),

    #[error("search failed (query: '{query}'): {message}")]
    QueryExecution { query: String, message: String },

    #[error("failed to start fetch workers: {0}")]
    WorkerPool(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for the missing-index condition that callers turn into a rebuild hint.
    pub fn is_index_missing(&self) -> bool {
        matches!(self, Error::IndexMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_missing_is_distinct() {
        let missing = Error::IndexMissing {
            path: PathBuf::from("/tmp/nowhere"),
        };
        let open = Error::IndexOpen {
            path: PathBuf::from("/tmp/nowhere"),
            message: "corrupt meta".to_string(),
        };

        assert!(missing.is_index_missing());
        assert!(!open.is_index_missing());
        assert!(missing.to_string().contains("mandex index"));
    }

    #[test]
    fn test_query_error_mentions_query() {
        let err = Error::QueryExecution {
            query: "foo AND (".to_string(),
            message: "syntax error".to_string(),
        };
        assert!(err.to_string().contains("foo AND ("));
    }
}
