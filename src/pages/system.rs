//! Page source backed by the installed man hierarchy and the `man` command.

use crate::error::{Error, Result};
use crate::pages::{PageEntry, PageSource};
use flate2::read::GzDecoder;
use ignore::WalkBuilder;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Directories searched in addition to `$MANPATH`
const DEFAULT_MAN_PATHS: &[&str] = &[
    "/usr/share/man",
    "/usr/local/share/man",
    "/opt/homebrew/share/man",
];

/// Compression suffixes stripped from file names
const COMPRESSED_SUFFIXES: &[&str] = &[".gz", ".bz2", ".xz", ".zst"];

/// Reads pages straight from the man directories and formats them with `man`
pub struct SystemPages {
    roots: Vec<PathBuf>,
}

impl SystemPages {
    /// Use the default roots, `$MANPATH` entries and any extra configured roots
    pub fn new(extra: &[PathBuf]) -> Self {
        let mut roots: Vec<PathBuf> = DEFAULT_MAN_PATHS.iter().map(PathBuf::from).collect();

        if let Ok(manpath) = std::env::var("MANPATH") {
            roots.extend(manpath.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
        roots.extend(extra.iter().cloned());

        Self::with_roots(roots)
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        let mut seen = FxHashSet::default();
        let roots = roots
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl PageSource for SystemPages {
    fn list(&self) -> Result<Vec<PageEntry>> {
        // (name, section) -> (root order, depth, entry); the smallest rank wins
        let mut found: FxHashMap<(String, String), (usize, usize, PageEntry)> =
            FxHashMap::default();

        for (order, root) in self.roots.iter().enumerate().filter(|(_, r)| r.is_dir()) {
            let walker = WalkBuilder::new(root)
                .standard_filters(false)
                .follow_links(true)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();

            // Unreadable entries are skipped, a broken root must not hide the others
            for entry in walker.filter_map(|e| e.ok()) {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let Some(page) = entry_from_path(entry.path()) else {
                    continue;
                };
                // Localized trees (`de/man1`) sit deeper than the primary `man1`
                let rank = (order, entry.depth());
                match found.entry((page.name.clone(), page.section.clone())) {
                    Entry::Vacant(slot) => {
                        slot.insert((rank.0, rank.1, page));
                    }
                    Entry::Occupied(mut slot) => {
                        let (kept_order, kept_depth, _) = slot.get();
                        if rank < (*kept_order, *kept_depth) {
                            slot.insert((rank.0, rank.1, page));
                        }
                    }
                }
            }
        }

        let mut pages: Vec<PageEntry> = found.into_values().map(|(_, _, page)| page).collect();

        if pages.is_empty() && !self.roots.iter().any(|r| r.is_dir()) {
            return Err(Error::Catalog(
                "no manual page directories found".to_string(),
            ));
        }

        pages.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.section.cmp(&b.section)));
        tracing::debug!(count = pages.len(), "enumerated manual pages");
        Ok(pages)
    }

    fn search(&self, query: &str) -> Result<Vec<PageEntry>> {
        let query = query.trim();
        if query.is_empty() || query == "." {
            return self.list();
        }

        let output = Command::new("man")
            .arg("-k")
            .arg(query)
            .output()
            .map_err(|e| Error::Catalog(format!("failed to run man -k: {}", e)))?;

        // man -k exits non-zero when nothing matches
        if !output.status.success() {
            return Ok(Vec::new());
        }

        Ok(parse_apropos(&String::from_utf8_lossy(&output.stdout)))
    }

    fn content(&self, name: &str, section: Option<&str>) -> Result<String> {
        let mut cmd = Command::new("man");
        if let Some(section) = section.filter(|s| !s.is_empty()) {
            cmd.arg(section);
        }
        cmd.arg(name).env("MANPAGER", "cat").env("MAN_KEEP_FORMATTING", "0");

        let output = cmd
            .output()
            .map_err(|e| Error::Catalog(format!("failed to run man: {}", e)))?;

        if !output.status.success() {
            let label = match section {
                Some(s) if !s.is_empty() => format!("{}({})", name, s),
                _ => name.to_string(),
            };
            return Err(Error::NotFound(label));
        }

        Ok(strip_overstrike(&String::from_utf8_lossy(&output.stdout)))
    }

    fn raw_content(&self, path: &Path) -> Result<Vec<u8>> {
        read_raw_page(path).map_err(|source| Error::DocumentFetch {
            id: path.display().to_string(),
            source,
        })
    }
}

/// Read a page file, decompressing `.gz` and `.zst` files.
///
/// Other compressed suffixes are rejected rather than returned as raw bytes.
pub fn read_raw_page(path: &Path) -> io::Result<Vec<u8>> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let mut buf = Vec::new();

    match extension {
        "gz" => {
            GzDecoder::new(File::open(path)?).read_to_end(&mut buf)?;
        }
        "zst" => {
            zstd::Decoder::new(File::open(path)?)?.read_to_end(&mut buf)?;
        }
        "bz2" | "xz" => {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported compression: .{}", extension),
            ));
        }
        _ => return fs::read(path),
    }
    Ok(buf)
}

/// Build an entry from a path like `.../man3/printf.3.gz`
fn entry_from_path(path: &Path) -> Option<PageEntry> {
    let dir = path.parent()?.file_name()?.to_str()?;
    let section = dir.strip_prefix("man").filter(|s| !s.is_empty())?;

    let mut file_name = path.file_name()?.to_str()?;
    for suffix in COMPRESSED_SUFFIXES {
        if let Some(stripped) = file_name.strip_suffix(suffix) {
            file_name = stripped;
            break;
        }
    }

    // Drop the section suffix (`ls.1`, `SSL_new.3ssl`) but keep dotted names
    // such as `systemd.unit.5`
    let name = match file_name.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().next() == section.chars().next() => stem,
        _ => file_name,
    };
    if name.is_empty() {
        return None;
    }

    Some(PageEntry::new(name, section).with_path(path))
}

/// Parse `man -k` output lines of the form `name (section) - description`
fn parse_apropos(output: &str) -> Vec<PageEntry> {
    let mut seen = FxHashSet::default();
    let mut pages = Vec::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let Some((head, description)) = line.split_once(" - ") else {
            continue;
        };
        let head = head.trim();
        let Some(open) = head.find('(') else {
            continue;
        };

        // `name, alias (1)` lists several names for one page; keep the first
        let name = head[..open].split(',').next().unwrap_or("").trim();
        let section = head[open..].trim_matches(|c| c == '(' || c == ')').trim();
        if name.is_empty() || section.is_empty() {
            continue;
        }

        if seen.insert((name.to_string(), section.to_string())) {
            pages.push(PageEntry::new(name, section).with_description(description.trim()));
        }
    }

    pages
}

/// Remove backspace overstrike sequences (`b\bb`, `_\bx`) left by the formatter
fn strip_overstrike(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\u{8}' {
            out.pop();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_entry_from_path() {
        let page = entry_from_path(Path::new("/usr/share/man/man1/ls.1.gz")).unwrap();
        assert_eq!(page.key(), ("ls", "1"));

        let page = entry_from_path(Path::new("/usr/share/man/man5/systemd.unit.5")).unwrap();
        assert_eq!(page.key(), ("systemd.unit", "5"));

        let page = entry_from_path(Path::new("/usr/share/man/man3/SSL_new.3ssl.gz")).unwrap();
        assert_eq!(page.key(), ("SSL_new", "3"));

        assert!(entry_from_path(Path::new("/usr/share/man/whatis")).is_none());
    }

    #[test]
    fn test_parse_apropos() {
        let output = "ls (1)               - list directory contents\n\
                      printf, fprintf (3)  - formatted output conversion\n\
                      garbage line\n\
                      ls (1)               - duplicate\n";
        let pages = parse_apropos(output);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].key(), ("ls", "1"));
        assert_eq!(pages[0].description, "list directory contents");
        assert_eq!(pages[1].key(), ("printf", "3"));
        assert!(pages[1].path.is_none());
    }

    #[test]
    fn test_strip_overstrike() {
        assert_eq!(strip_overstrike("N\u{8}NA\u{8}AM\u{8}ME\u{8}E"), "NAME");
        assert_eq!(strip_overstrike("_\u{8}x"), "x");
    }

    #[test]
    fn test_list_dedups_and_sorts() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a");
        let second = temp.path().join("b");
        fs::create_dir_all(first.join("man1")).unwrap();
        fs::create_dir_all(second.join("man1")).unwrap();
        fs::create_dir_all(first.join("man3")).unwrap();

        fs::write(first.join("man1/zsh.1"), ".TH ZSH 1").unwrap();
        fs::write(first.join("man1/cat.1"), ".TH CAT 1").unwrap();
        fs::write(first.join("man3/cat.3"), ".TH CAT 3").unwrap();
        fs::write(second.join("man1/cat.1"), ".TH CAT 1 other").unwrap();

        let source = SystemPages::with_roots(vec![first.clone(), second]);
        let pages = source.list().unwrap();
        let keys: Vec<_> = pages.iter().map(|p| p.doc_id()).collect();

        assert_eq!(keys, vec!["cat(1)", "cat(3)", "zsh(1)"]);
        assert_eq!(pages[0].path.as_deref(), Some(first.join("man1/cat.1").as_path()));
    }

    #[test]
    fn test_list_without_roots_is_catalog_error() {
        let source = SystemPages::with_roots(vec![PathBuf::from("/definitely/not/here")]);
        assert!(matches!(source.list(), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_raw_content_gunzips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ls.1.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b".TH LS 1\nlist directory contents\n").unwrap();
        encoder.finish().unwrap();

        let plain = temp.path().join("cat.1");
        fs::write(&plain, b".TH CAT 1\n").unwrap();

        let source = SystemPages::with_roots(Vec::new());
        assert_eq!(
            source.raw_content(&path).unwrap(),
            b".TH LS 1\nlist directory contents\n"
        );
        assert_eq!(source.raw_content(&plain).unwrap(), b".TH CAT 1\n");
    }

    #[test]
    fn test_raw_content_unzstds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tar.1.zst");
        let compressed = zstd::encode_all(&b".TH TAR 1\nan archiving utility\n"[..], 3).unwrap();
        fs::write(&path, compressed).unwrap();

        let source = SystemPages::with_roots(Vec::new());
        assert_eq!(
            source.raw_content(&path).unwrap(),
            b".TH TAR 1\nan archiving utility\n"
        );
    }

    #[test]
    fn test_raw_content_rejects_unsupported_compression() {
        let temp = TempDir::new().unwrap();
        let source = SystemPages::with_roots(Vec::new());

        for name in ["xzpage.1.xz", "bzpage.1.bz2"] {
            let path = temp.path().join(name);
            fs::write(&path, [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x01, 0x02]).unwrap();

            match source.raw_content(&path) {
                Err(Error::DocumentFetch { source, .. }) => {
                    assert_eq!(source.kind(), io::ErrorKind::Unsupported)
                }
                other => panic!("expected DocumentFetch for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_list_prefers_primary_over_localized_page() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("man");
        for dir in ["man1", "de/man1", "aa/man1"] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("ls.1"), ".TH LS 1").unwrap();
        }

        let source = SystemPages::with_roots(vec![root.clone()]);
        for _ in 0..3 {
            let pages = source.list().unwrap();
            assert_eq!(pages.len(), 1);
            assert_eq!(pages[0].path.as_deref(), Some(root.join("man1/ls.1").as_path()));
        }
    }

    #[test]
    fn test_raw_content_missing_file() {
        let source = SystemPages::with_roots(Vec::new());
        let err = source.raw_content(Path::new("/no/such/page.1")).unwrap_err();
        assert!(matches!(err, Error::DocumentFetch { .. }));
    }
}
