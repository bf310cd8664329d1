//! Plain-text output for deep search results

use crate::query::{SearchResult, Suggestion};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout_for(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print search results with their excerpts, query occurrences highlighted
pub fn print_search_results(results: &[SearchResult], query: &str, color: bool) -> io::Result<()> {
    let mut stdout = stdout_for(color);

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            writeln!(stdout)?;
        }

        // Heading
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(stdout, "{}", result.page.doc_id())?;
        stdout.reset()?;
        if !result.page.description.is_empty() {
            write!(stdout, " - {}", result.page.description)?;
        }
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(stdout, " [{:.2}]", result.score)?;
        stdout.reset()?;

        if result.excerpts.is_empty() {
            // Match was in the name or description only; fall back to the engine snippet
            if !result.highlight.is_empty() {
                writeln!(stdout, "  {}", result.highlight.replace('\n', " "))?;
            }
            continue;
        }

        for (n, excerpt) in result.excerpts.iter().enumerate() {
            if n > 0 {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                writeln!(stdout, "  --")?;
                stdout.reset()?;
            }
            for line in excerpt.lines() {
                write!(stdout, "  ")?;
                print_highlighted(&mut stdout, line, query)?;
                writeln!(stdout)?;
            }
        }
    }

    Ok(())
}

/// Print near-miss page names for a query that found nothing
pub fn print_suggestions(query: &str, suggestions: &[Suggestion], color: bool) -> io::Result<()> {
    let mut stdout = stdout_for(color);

    writeln!(stdout, "No pages match '{}'.", query)?;
    if suggestions.is_empty() {
        return Ok(());
    }

    writeln!(stdout, "Did you mean:")?;
    for s in suggestions {
        write!(stdout, "  ")?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", s.page.doc_id())?;
        stdout.reset()?;
        if !s.page.description.is_empty() {
            write!(stdout, " - {}", s.page.description)?;
        }
        writeln!(stdout)?;
    }

    Ok(())
}

/// Write `line` with every ASCII-case-insensitive occurrence of `query` in bold red
fn print_highlighted(stdout: &mut StandardStream, line: &str, query: &str) -> io::Result<()> {
    let mut last = 0;
    for (start, end) in match_ranges(line, query) {
        write!(stdout, "{}", &line[last..start])?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stdout, "{}", &line[start..end])?;
        stdout.reset()?;
        last = end;
    }
    write!(stdout, "{}", &line[last..])
}

/// Non-overlapping byte ranges of `query` in `line`, ignoring ASCII case
fn match_ranges(line: &str, query: &str) -> Vec<(usize, usize)> {
    if query.is_empty() {
        return Vec::new();
    }
    let haystack = line.to_ascii_lowercase();
    let needle = query.to_ascii_lowercase();

    let mut ranges = Vec::new();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        ranges.push((start, end));
        from = end;
    }
    ranges
}
