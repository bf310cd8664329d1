//! Full-text engine backed by tantivy.
//!
//! A rebuild owns the index exclusively through [`PageIndexWriter`];
//! queries go through the read-only [`PageIndex`]. Nothing else in the crate
//! depends on the on-disk format.

use crate::error::{Error, Result};
use crate::index::build::BatchSink;
use crate::index::types::{IndexDocument, SearchHit};
use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, QueryParser};
use tantivy::schema::{Field, STORED, STRING, Schema, TEXT, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError, Term};

/// Memory budget for the tantivy writer, split across its indexing threads
const WRITER_HEAP_BYTES: usize = 50_000_000;
const WRITER_THREADS: usize = 2;

/// Maximum characters in a highlighted snippet
const SNIPPET_MAX_CHARS: usize = 200;

/// File tantivy writes once an index exists
const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, Copy)]
struct Fields {
    id: Field,
    name: Field,
    section: Field,
    description: Field,
    content: Field,
    path: Field,
}

impl Fields {
    fn build_schema() -> (Schema, Self) {
        let mut builder = Schema::builder();
        let fields = Self {
            id: builder.add_text_field("id", STRING | STORED),
            name: builder.add_text_field("name", TEXT | STORED),
            section: builder.add_text_field("section", TEXT | STORED),
            description: builder.add_text_field("description", TEXT | STORED),
            content: builder.add_text_field("content", TEXT | STORED),
            path: builder.add_text_field("path", STORED),
        };
        (builder.build(), fields)
    }

    fn from_schema(schema: &Schema) -> std::result::Result<Self, TantivyError> {
        Ok(Self {
            id: schema.get_field("id")?,
            name: schema.get_field("name")?,
            section: schema.get_field("section")?,
            description: schema.get_field("description")?,
            content: schema.get_field("content")?,
            path: schema.get_field("path")?,
        })
    }

    /// Fields searched by free-text queries
    fn queryable(&self) -> Vec<Field> {
        vec![self.name, self.section, self.description, self.content]
    }
}

/// Whether an index has been written at `location`
pub fn index_exists(location: &Path) -> bool {
    location.join(META_FILE).exists()
}

/// Exclusive write handle used while rebuilding
pub struct PageIndexWriter {
    writer: IndexWriter,
    fields: Fields,
    location: PathBuf,
}

impl PageIndexWriter {
    /// Destroy whatever is at `location` and create an empty index there
    pub fn create(location: &Path) -> Result<Self> {
        let create_err = |message: String| Error::IndexCreate {
            path: location.to_path_buf(),
            message,
        };

        if location.exists() {
            fs::remove_dir_all(location)
                .map_err(|e| create_err(format!("failed to remove old index: {}", e)))?;
        }
        fs::create_dir_all(location).map_err(|e| create_err(e.to_string()))?;

        let (schema, fields) = Fields::build_schema();
        let index = Index::create_in_dir(location, schema).map_err(|e| create_err(e.to_string()))?;
        let writer: IndexWriter = index
            .writer_with_num_threads(WRITER_THREADS, WRITER_HEAP_BYTES)
            .map_err(|e| create_err(e.to_string()))?;

        tracing::debug!(path = %location.display(), "created index");
        Ok(Self {
            writer,
            fields,
            location: location.to_path_buf(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Upsert a batch of documents keyed by composite ID and commit it
    pub fn index_batch(&mut self, docs: Vec<IndexDocument>) -> Result<()> {
        for doc in docs {
            let id = doc.doc_id();
            self.writer
                .delete_term(Term::from_field_text(self.fields.id, &id));

            let mut tdoc = TantivyDocument::default();
            tdoc.add_text(self.fields.id, &id);
            tdoc.add_text(self.fields.name, &doc.name);
            tdoc.add_text(self.fields.section, &doc.section);
            tdoc.add_text(self.fields.description, &doc.description);
            tdoc.add_text(self.fields.content, &doc.content);
            if let Some(path) = &doc.path {
                tdoc.add_text(self.fields.path, path.to_string_lossy());
            }

            self.writer
                .add_document(tdoc)
                .map_err(|e| Error::IndexWrite(format!("{}: {}", id, e)))?;
        }

        self.writer
            .commit()
            .map_err(|e| Error::IndexWrite(e.to_string()))?;
        Ok(())
    }

    /// Wait for background merges so the directory is complete on return
    pub fn finish(self) -> Result<()> {
        self.writer
            .wait_merging_threads()
            .map_err(|e| Error::IndexWrite(e.to_string()))
    }
}

impl BatchSink for PageIndexWriter {
    fn commit_batch(&mut self, batch: Vec<IndexDocument>) -> Result<()> {
        self.index_batch(batch)
    }
}

/// Read-only handle used for queries
pub struct PageIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    location: PathBuf,
}

impl PageIndex {
    /// Open an existing index. Absence is reported as [`Error::IndexMissing`].
    pub fn open(location: &Path) -> Result<Self> {
        if !index_exists(location) {
            return Err(Error::IndexMissing {
                path: location.to_path_buf(),
            });
        }

        let open_err = |e: TantivyError| Error::IndexOpen {
            path: location.to_path_buf(),
            message: e.to_string(),
        };

        let index = Index::open_in_dir(location).map_err(open_err)?;
        let fields = Fields::from_schema(&index.schema()).map_err(open_err)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(open_err)?;

        Ok(Self {
            index,
            reader,
            fields,
            location: location.to_path_buf(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Ranked hits for a free-text query over name, section, description and content
    pub fn query(&self, text: &str, max_hits: usize) -> Result<Vec<SearchHit>> {
        let query_err = |message: String| Error::QueryExecution {
            query: text.to_string(),
            message,
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, self.fields.queryable());
        let query = parser
            .parse_query(text)
            .map_err(|e| query_err(e.to_string()))?;

        let top_docs = searcher
            .search(&*query, &TopDocs::with_limit(max_hits.max(1)))
            .map_err(|e| query_err(e.to_string()))?;

        // Content first; hits that only matched a short field fall back to it
        let mut snippets = Vec::with_capacity(3);
        for field in [self.fields.content, self.fields.description, self.fields.name] {
            let mut generator = SnippetGenerator::create(&searcher, &*query, field)
                .map_err(|e| query_err(e.to_string()))?;
            generator.set_max_num_chars(SNIPPET_MAX_CHARS);
            snippets.push(generator);
        }

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| query_err(e.to_string()))?;

            let highlight = snippets
                .iter()
                .map(|generator| generator.snippet_from_doc(&doc))
                .find(|snippet| !snippet.highlighted().is_empty())
                .map(|snippet| mark_highlights(snippet.fragment(), snippet.highlighted()))
                .unwrap_or_default();
            let path = text_field(&doc, self.fields.path);

            hits.push(SearchHit {
                doc_id: text_field(&doc, self.fields.id),
                score,
                description: text_field(&doc, self.fields.description),
                content: text_field(&doc, self.fields.content),
                path: (!path.is_empty()).then(|| PathBuf::from(path)),
                highlight,
            });
        }

        Ok(hits)
    }

    /// Every composite ID in the index, sorted
    pub fn document_ids(&self) -> Result<BTreeSet<String>> {
        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);
        let read_err = |e: TantivyError| Error::IndexOpen {
            path: self.location.clone(),
            message: e.to_string(),
        };

        let top_docs = searcher
            .search(&AllQuery, &TopDocs::with_limit(limit))
            .map_err(read_err)?;

        let mut ids = BTreeSet::new();
        for (_, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(read_err)?;
            ids.insert(text_field(&doc, self.fields.id));
        }
        Ok(ids)
    }
}

fn text_field(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Wrap highlighted ranges of a snippet fragment in `[` `]`
fn mark_highlights(fragment: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(fragment.len() + ranges.len() * 2);
    let mut last = 0;
    for range in ranges {
        if range.start < last || range.end > fragment.len() {
            continue;
        }
        out.push_str(&fragment[last..range.start]);
        out.push('[');
        out.push_str(&fragment[range.clone()]);
        out.push(']');
        last = range.end;
    }
    out.push_str(&fragment[last..]);
    out
}
