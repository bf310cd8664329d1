use ratatui::style::{Color, Modifier, Style};

/// Render configuration handed to [`crate::tui::ui::draw`]
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub border: Style,
    pub title: Style,
    pub selected: Style,
    pub name: Style,
    pub section: Style,
    pub description: Style,
    pub suggestion: Style,
    pub filter_on: Style,
    pub filter_off: Style,
    pub input: Style,
    pub status: Style,
    pub error: Style,
    pub progress: Style,
    /// In-document match line
    pub match_line: Style,
    /// Current match line
    pub current_match: Style,
    pub line_number: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Style::default().fg(Color::DarkGray),
            title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            selected: Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            name: Style::default().fg(Color::Blue),
            section: Style::default().fg(Color::Yellow),
            description: Style::default().fg(Color::White),
            suggestion: Style::default().fg(Color::Magenta),
            filter_on: Style::default().fg(Color::Green),
            filter_off: Style::default().fg(Color::DarkGray),
            input: Style::default().fg(Color::Yellow),
            status: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            progress: Style::default().fg(Color::Green),
            match_line: Style::default().fg(Color::Yellow),
            current_match: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            line_number: Style::default().fg(Color::DarkGray),
        }
    }
}
