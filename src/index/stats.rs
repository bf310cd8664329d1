use crate::index::engine::PageIndex;
use crate::pages::{default_filters, parse_doc_id};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Display index statistics
pub fn show_stats(location: &Path) -> Result<()> {
    let index = PageIndex::open(location)?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index location:   {}", location.display());
    println!("Document count:   {}", index.doc_count());

    let sections = section_counts(&index)?;
    if !sections.is_empty() {
        println!();
        println!("Pages by section:");
        let labels = default_filters();
        for (code, count) in &sections {
            let label = labels
                .iter()
                .find(|f| f.code == *code)
                .map(|f| f.label)
                .unwrap_or("Other");
            println!("  {} {:25} {}", code, label, count);
        }
    }

    if let Ok(size) = dir_size(location) {
        println!();
        println!("Index size:       {}", format_size(size));
    }

    Ok(())
}

/// Document counts keyed by section category
fn section_counts(index: &PageIndex) -> Result<BTreeMap<char, usize>> {
    let mut counts = BTreeMap::new();
    for id in index.document_ids()? {
        let (_, section) = parse_doc_id(&id);
        if let Some(code) = section.chars().next() {
            *counts.entry(code).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Calculate directory size recursively
pub fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
