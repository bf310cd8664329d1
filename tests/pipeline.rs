//! End-to-end tests for the index rebuild over an on-disk man hierarchy.

use flate2::Compression;
use flate2::write::GzEncoder;
use mandex::index::{BuildOptions, PageIndex, rebuild_index};
use mandex::pages::{PageEntry, PageSource, SystemPages};
use mandex::query::search;
use mandex::utils::CancelToken;
use mandex::Error;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const PAGES: usize = 250;

fn page_source(i: usize) -> String {
    format!(
        ".TH PAGE{i} 3\n.SH NAME\npage{i} \\- synthetic page {i}\n.SH DESCRIPTION\nkeyword{i} appears here.\n"
    )
}

/// A man tree with `PAGES` pages in section 3; every fifth one gzipped
fn man_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let man3 = dir.path().join("man3");
    fs::create_dir_all(&man3).unwrap();

    for i in 0..PAGES {
        let body = page_source(i);
        if i % 5 == 0 {
            let file = fs::File::create(man3.join(format!("page{i}.3.gz"))).unwrap();
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(body.as_bytes()).unwrap();
            encoder.finish().unwrap();
        } else {
            fs::write(man3.join(format!("page{i}.3")), body).unwrap();
        }
    }
    dir
}

fn options() -> BuildOptions {
    BuildOptions {
        workers: 8,
        batch_size: 100,
        queue_capacity: 32,
        progress_every: 100,
    }
}

fn build(location: &Path, catalog: &[PageEntry], source: &SystemPages) -> mandex::Result<mandex::index::IndexReport> {
    rebuild_index(location, catalog, source, &options(), &CancelToken::new(), &mut |_| {})
}

#[test]
fn test_rebuild_counts_unreadable_pages() {
    let tree = man_tree();
    let source = SystemPages::with_roots(vec![tree.path().to_path_buf()]);
    let catalog = source.list().unwrap();
    assert_eq!(catalog.len(), PAGES);

    // Pages that vanish between listing and fetching
    let removed: Vec<&PageEntry> = catalog.iter().step_by(25).collect();
    for page in &removed {
        fs::remove_file(page.path.as_ref().unwrap()).unwrap();
    }
    assert_eq!(removed.len(), 10);

    let out = tempfile::tempdir().unwrap();
    let location = out.path().join("index");
    let report = build(&location, &catalog, &source).unwrap();

    assert_eq!(report.processed, 250);
    assert_eq!(report.indexed, 240);

    let index = PageIndex::open(&location).unwrap();
    assert_eq!(index.doc_count(), 240);
    let ids = index.document_ids().unwrap();
    for page in &removed {
        assert!(!ids.contains(&page.doc_id()));
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    let tree = man_tree();
    let source = SystemPages::with_roots(vec![tree.path().to_path_buf()]);
    let catalog = source.list().unwrap();

    let out = tempfile::tempdir().unwrap();
    let location = out.path().join("index");

    build(&location, &catalog, &source).unwrap();
    let first = PageIndex::open(&location).unwrap().document_ids().unwrap();

    build(&location, &catalog, &source).unwrap();
    let second = PageIndex::open(&location).unwrap().document_ids().unwrap();

    let expected: BTreeSet<String> = catalog.iter().map(PageEntry::doc_id).collect();
    assert_eq!(first, expected);
    assert_eq!(second, expected);
}

#[test]
fn test_deep_search_over_compressed_and_plain_pages() {
    let tree = man_tree();
    let source = SystemPages::with_roots(vec![tree.path().to_path_buf()]);
    let catalog = source.list().unwrap();

    let out = tempfile::tempdir().unwrap();
    let location = out.path().join("index");
    build(&location, &catalog, &source).unwrap();

    // page10 was gzipped, page11 was not
    for n in [10, 11] {
        let query = format!("keyword{n}");
        let results = search(&location, &query).unwrap();
        assert!(!results.is_empty(), "no hit for {query}");

        let top = &results[0];
        assert_eq!(top.page.name, format!("page{n}"));
        assert_eq!(top.page.section, "3");
        assert_eq!(top.excerpt_count, 1);
        assert!(top.excerpts[0].contains(&query));
    }
}

#[test]
fn test_missing_index_is_distinct() {
    let out = tempfile::tempdir().unwrap();
    let location = out.path().join("index");

    let err = search(&location, "anything").unwrap_err();
    assert!(matches!(err, Error::IndexMissing { .. }));
    assert!(!location.exists());
}

#[test]
fn test_cancelled_rebuild() {
    let tree = man_tree();
    let source = SystemPages::with_roots(vec![tree.path().to_path_buf()]);
    let catalog = source.list().unwrap();

    let out = tempfile::tempdir().unwrap();
    let token = CancelToken::new();
    token.cancel();

    let result = rebuild_index(
        &out.path().join("index"),
        &catalog,
        &source,
        &options(),
        &token,
        &mut |_| {},
    );
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_unsupported_compression_counts_as_failure() {
    let tree = tempfile::tempdir().unwrap();
    let man1 = tree.path().join("man1");
    fs::create_dir_all(&man1).unwrap();
    fs::write(man1.join("plain.1"), page_source(1)).unwrap();
    fs::write(man1.join("xzpage.1.xz"), [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x10, 0x20]).unwrap();

    let source = SystemPages::with_roots(vec![tree.path().to_path_buf()]);
    let catalog = source.list().unwrap();
    assert_eq!(catalog.len(), 2);

    let out = tempfile::tempdir().unwrap();
    let location = out.path().join("index");
    let report = build(&location, &catalog, &source).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.indexed, 1);
    assert!(search(&location, "7zXZ").unwrap().is_empty());
}
