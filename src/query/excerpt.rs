//! Line-oriented text matching: excerpt windows for search results and
//! match navigation inside an open page.

/// Maximum excerpt windows per document
pub const MAX_EXCERPTS: usize = 3;

/// Lines of context on each side of a matching line
pub const CONTEXT_LINES: usize = 3;

/// Indices of all lines containing `query`, case-insensitively, ascending.
///
/// An empty query matches nothing.
pub fn find_matching_lines(content: &str, query: &str) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// Context windows around the first [`MAX_EXCERPTS`] matching lines.
///
/// Each window spans up to [`CONTEXT_LINES`] lines either side of the match,
/// clipped to the document and trimmed.
pub fn extract_excerpts(content: &str, query: &str) -> Vec<String> {
    let matches = find_matching_lines(content, query);
    if matches.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    matches
        .into_iter()
        .take(MAX_EXCERPTS)
        .map(|line| {
            let start = line.saturating_sub(CONTEXT_LINES);
            let end = (line + CONTEXT_LINES + 1).min(lines.len());
            lines[start..end].join("\n").trim().to_string()
        })
        .collect()
}

/// Position within the match list of an open document.
///
/// Stepping past either end wraps around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCursor {
    lines: Vec<usize>,
    current: usize,
}

impl MatchCursor {
    pub fn new(lines: Vec<usize>) -> Self {
        Self { lines, current: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Index of the current match within the list
    pub fn index(&self) -> usize {
        self.current
    }

    /// Line number of the current match
    pub fn current_line(&self) -> Option<usize> {
        self.lines.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.lines.len();
        self.current_line()
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }
        self.current = self.current.checked_sub(1).unwrap_or(self.lines.len() - 1);
        self.current_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_find_matching_lines() {
        let content = "NAME\n    ls - list\nSYNOPSIS\n    ls [OPTION]\n";
        assert_eq!(find_matching_lines(content, "LS"), vec![1, 3]);
        assert!(find_matching_lines(content, "").is_empty());
        assert!(find_matching_lines("", "ls").is_empty());
    }

    #[test]
    fn test_no_cap_on_in_document_matches() {
        let content = "x\n".repeat(50);
        assert_eq!(find_matching_lines(&content, "x").len(), 50);
    }

    #[test]
    fn test_excerpts_capped_at_three() {
        let content = "match\nfiller\n".repeat(20);
        let excerpts = extract_excerpts(&content, "match");
        assert_eq!(excerpts.len(), MAX_EXCERPTS);
    }

    #[test]
    fn test_excerpt_window_bounds() {
        let mut lines: Vec<String> = (0..20).map(|i| format!("line {}", i)).collect();
        lines[10] = "the needle is here".to_string();
        let excerpts = extract_excerpts(&lines.join("\n"), "needle");

        assert_eq!(excerpts.len(), 1);
        let window: Vec<&str> = excerpts[0].lines().collect();
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], "line 7");
        assert_eq!(window[3], "the needle is here");
        assert_eq!(window[6], "line 13");
    }

    #[test]
    fn test_excerpt_clipped_at_document_edges() {
        let content = numbered(5);
        let excerpts = extract_excerpts(&content, "line 0");
        assert_eq!(excerpts[0], "line 0\nline 1\nline 2\nline 3");

        let excerpts = extract_excerpts(&content, "line 4");
        assert_eq!(excerpts[0], "line 1\nline 2\nline 3\nline 4");
    }

    #[test]
    fn test_excerpts_in_line_order() {
        let content = "alpha key\nb\nc\nd\ne\nf\ng\nh\ni\nomega KEY";
        let excerpts = extract_excerpts(content, "key");
        assert_eq!(excerpts.len(), 2);
        assert!(excerpts[0].starts_with("alpha key"));
        assert!(excerpts[1].ends_with("omega KEY"));
    }

    #[test]
    fn test_excerpts_are_trimmed() {
        let excerpts = extract_excerpts("\n\n   needle   \n\n", "needle");
        assert_eq!(excerpts, vec!["needle".to_string()]);
    }

    #[test]
    fn test_match_cursor_wraps_both_ways() {
        let mut cursor = MatchCursor::new(vec![0, 5]);
        assert_eq!(cursor.current_line(), Some(0));
        assert_eq!(cursor.next(), Some(5));
        assert_eq!(cursor.next(), Some(0));
        assert_eq!(cursor.prev(), Some(5));
        assert_eq!(cursor.prev(), Some(0));
    }

    #[test]
    fn test_empty_match_cursor() {
        let mut cursor = MatchCursor::default();
        assert!(cursor.is_empty());
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.prev(), None);
        assert_eq!(cursor.current_line(), None);
    }
}
