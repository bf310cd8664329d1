//! Near-match suggestions for queries that found nothing.
//!
//! Candidates are ranked by case-insensitive Levenshtein distance between the
//! query and the page name, with a fixed bonus when the query occurs inside
//! the name. Lower is better.

use crate::pages::PageEntry;

/// Bonus subtracted when the query is a substring of the name
pub const SUBSTRING_BONUS: i64 = 5;

/// Candidates above this adjusted distance are dropped
pub const MAX_DISTANCE: i64 = 5;

/// Maximum number of suggestions returned
pub const MAX_SUGGESTIONS: usize = 10;

/// A catalog entry with its adjusted distance to the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub page: PageEntry,
    pub distance: i64,
}

/// Case-insensitive edit distance (insert, delete and substitute all cost 1)
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row DP over the alignment matrix
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Distance after applying the substring bonus
pub fn adjusted_distance(query: &str, name: &str) -> i64 {
    let mut distance = edit_distance(query, name) as i64;
    if name.to_lowercase().contains(&query.to_lowercase()) {
        distance -= SUBSTRING_BONUS;
    }
    distance
}

/// Best matching catalog entries for `query`, closest first.
///
/// Ties keep catalog order, so identical input always gives identical output.
pub fn suggest(query: &str, catalog: &[PageEntry]) -> Vec<Suggestion> {
    let mut scored: Vec<Suggestion> = catalog
        .iter()
        .filter_map(|page| {
            let distance = adjusted_distance(query, &page.name);
            (distance <= MAX_DISTANCE).then(|| Suggestion {
                page: page.clone(),
                distance,
            })
        })
        .collect();

    // Stable sort
    scored.sort_by_key(|s| s.distance);
    scored.truncate(MAX_SUGGESTIONS);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<PageEntry> {
        names.iter().map(|n| PageEntry::new(*n, "3")).collect()
    }

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(edit_distance("grep", "grpe"), 2);
        assert_eq!(edit_distance("grep", "grep"), 0);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_edit_distance_case_insensitive() {
        assert_eq!(edit_distance("GREP", "grep"), 0);
        assert_eq!(edit_distance("Printf", "PRINTF"), 0);
    }

    #[test]
    fn test_edit_distance_symmetric() {
        for (a, b) in [("uv_loop", "uv_run"), ("ls", "lsblk"), ("", "x"), ("abc", "cab")] {
            assert_eq!(edit_distance(a, b), edit_distance(b, a));
        }
    }

    #[test]
    fn test_substring_bonus() {
        // "loop" vs "uv_loop_init": 8 insertions, minus the bonus
        assert_eq!(adjusted_distance("loop", "uv_loop_init"), 3);
        assert_eq!(adjusted_distance("LOOP", "uv_loop_init"), 3);
    }

    #[test]
    fn test_suggest_uv_loop() {
        let pages = catalog(&["uv_run", "printf", "uv_loop_init", "zlib", "uv_loop_close"]);
        let suggestions = suggest("uv_loop", &pages);

        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
        assert!(suggestions.iter().all(|s| s.distance <= MAX_DISTANCE));
        assert!(suggestions.iter().any(|s| s.page.name == "uv_run"));
        assert!(suggestions.iter().all(|s| s.page.name != "printf"));
        // Substring matches outrank the plain near miss
        assert_eq!(suggestions[0].page.name, "uv_loop_init");
    }

    #[test]
    fn test_suggest_caps_and_orders() {
        let names: Vec<String> = (0..30).map(|i| format!("ab{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let pages = catalog(&refs);

        let suggestions = suggest("ab", &pages);
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert!(suggestions.windows(2).all(|w| w[0].distance <= w[1].distance));
        // Equal distances keep catalog order
        assert_eq!(suggestions[0].page.name, "ab0");
        assert_eq!(suggestions[1].page.name, "ab1");
    }

    #[test]
    fn test_suggest_deterministic() {
        let pages = catalog(&["read", "readv", "pread", "bread", "readdir", "fread"]);
        assert_eq!(suggest("rea", &pages), suggest("rea", &pages));
    }

    #[test]
    fn test_suggest_empty_catalog() {
        assert!(suggest("anything", &[]).is_empty());
    }
}
