use crate::tui::app::{App, Listing, Mode};
use crate::tui::theme::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

const HEADER_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;

/// Rows of page text visible in detail mode for a terminal of `height` rows
pub fn detail_viewport_height(height: u16) -> usize {
    // Header, status bar and the detail block's borders
    height.saturating_sub(HEADER_HEIGHT + STATUS_HEIGHT + 2) as usize
}

pub fn draw(f: &mut Frame, app: &App, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(5),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(f.area());

    draw_header(f, app, theme, chunks[0]);
    match app.mode {
        Mode::List | Mode::ListSearchInput => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[1]);
            draw_page_list(f, app, theme, panes[0]);
            draw_preview(f, app, theme, panes[1]);
        }
        Mode::Detail | Mode::DetailSearchInput => draw_detail(f, app, theme, chunks[1]),
    }
    draw_status_bar(f, app, theme, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border);

    let typing = matches!(app.mode, Mode::ListSearchInput | Mode::DetailSearchInput);
    if typing {
        let title = if app.mode == Mode::ListSearchInput {
            " Search pages (Enter: search, Esc: cancel) "
        } else {
            " Find in page (Enter: find, Esc: cancel) "
        };
        let input = Paragraph::new(app.input.as_str())
            .style(theme.input)
            .block(block.title(title));
        f.render_widget(input, area);
        f.set_cursor_position((area.x + app.input.chars().count() as u16 + 1, area.y + 1));
        return;
    }

    let mut spans = vec![Span::styled("Sections: ", theme.title)];
    for filter in &app.filters {
        let style = if filter.enabled {
            theme.filter_on
        } else {
            theme.filter_off
        };
        spans.push(Span::styled(format!("{} ", filter.code), style));
    }
    let title = match &app.listing {
        Listing::All => " All pages ".to_string(),
        Listing::Query(q) => format!(" Keyword: {} ", q),
        Listing::Deep(q) => format!(" Full text: {} ", q),
    };
    let header = Paragraph::new(Line::from(spans)).block(block.title(title));
    f.render_widget(header, area);
}

fn draw_page_list(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let suggestions = app.showing_suggestions();
    let pages: Vec<_> = if suggestions {
        app.suggestions.iter().map(|s| &s.page).collect()
    } else {
        app.filtered.iter().collect()
    };

    let items: Vec<ListItem> = pages
        .iter()
        .map(|page| {
            let name_style = if suggestions { theme.suggestion } else { theme.name };
            let mut spans = vec![
                Span::styled(page.name.clone(), name_style),
                Span::styled(format!("({})", page.section), theme.section),
            ];
            if !page.description.is_empty() {
                spans.push(Span::styled(
                    format!(" - {}", page.description),
                    theme.description,
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if suggestions {
        format!(" Did you mean ({}) ", pages.len())
    } else {
        format!(" Pages ({}/{}) ", app.filtered.len(), app.catalog.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(title),
        )
        .highlight_style(theme.selected);

    let mut state = ListState::default();
    if !pages.is_empty() {
        state.select(Some(app.cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_preview(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = match app.selected() {
        Some(page) => format!(" {} ", page.doc_id()),
        None => " Preview ".to_string(),
    };

    let body = match (&app.preview, app.selected()) {
        (Some(text), _) => Text::raw(text.as_str()),
        (None, Some(_)) => Text::raw("Loading..."),
        (None, None) => Text::raw("No page selected"),
    };

    let preview = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(title),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(preview, area);
}

fn draw_detail(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = match &app.detail_page {
        Some(page) => format!(" {} ", page.doc_id()),
        None => " Page ".to_string(),
    };

    let content = match &app.detail {
        Some(text) => {
            let current = app.matches.current_line();
            let lines: Vec<Line> = text
                .lines()
                .enumerate()
                .skip(app.scroll)
                .take(area.height.saturating_sub(2) as usize)
                .map(|(idx, line)| {
                    let style = if Some(idx) == current {
                        theme.current_match
                    } else if app.matches.lines().binary_search(&idx).is_ok() {
                        theme.match_line
                    } else {
                        theme.description
                    };
                    Line::from(vec![
                        Span::styled(format!("{:5} ", idx + 1), theme.line_number),
                        Span::styled(line, style),
                    ])
                })
                .collect();
            Text::from(lines)
        }
        None if app.loading => Text::raw("Loading..."),
        None => Text::raw("No content"),
    };

    let detail = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(title),
    );

    f.render_widget(detail, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let line = if let Some(error) = &app.error {
        Line::from(Span::styled(error.message.as_str(), theme.error))
    } else if let Some(progress) = app.indexing {
        Line::from(Span::styled(
            format!(
                "Indexing {}/{} ({} indexed) - Esc to cancel",
                progress.processed, progress.total, progress.indexed
            ),
            theme.progress,
        ))
    } else if app.mode == Mode::Detail && !app.matches.is_empty() {
        Line::from(Span::styled(
            format!(
                "Match {}/{} for '{}' (n/N to cycle)",
                app.matches.index() + 1,
                app.matches.len(),
                app.doc_query
            ),
            theme.status,
        ))
    } else {
        Line::from(Span::styled(app.status.as_str(), theme.status))
    };

    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageEntry;
    use crate::tui::app::Event;
    use ratatui::{Terminal, backend::TestBackend};

    fn rendered(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_viewport_height() {
        assert_eq!(detail_viewport_height(30), 24);
        assert_eq!(detail_viewport_height(3), 0);
    }

    #[test]
    fn test_draw_list_and_suggestions() {
        let (mut app, _) = App::new(Some("prntf".to_string()));
        app.update(Event::PagesLoaded {
            listing: Listing::Query("prntf".to_string()),
            result: Ok(Vec::new()),
        });
        app.update(Event::PagesLoaded {
            listing: Listing::All,
            result: Ok(vec![PageEntry::new("printf", "3"), PageEntry::new("zlib", "3")]),
        });

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &app, &Theme::default())).unwrap();

        let screen = rendered(&terminal);
        assert!(screen.contains("Did you mean"));
        assert!(screen.contains("printf(3)"));
    }
}
