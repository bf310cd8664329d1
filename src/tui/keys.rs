use crate::tui::app::{Action, Mode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Resolve a key press to an action for the given mode
pub fn action_for(mode: Mode, key: KeyEvent) -> Option<Action> {
    // Global keybindings
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('d') if mode == Mode::Detail => Some(Action::HalfPageDown),
            KeyCode::Char('u') if mode == Mode::Detail => Some(Action::HalfPageUp),
            _ => None,
        };
    }

    match mode {
        Mode::List => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::Enter => Some(Action::Open),
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char(c @ '1'..='9') => Some(Action::ToggleSection(c)),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::F(5) => Some(Action::RebuildIndex),
            KeyCode::Esc => Some(Action::CancelRebuild),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        Mode::Detail => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollDown),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
            KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
            KeyCode::Char('u') | KeyCode::PageUp => Some(Action::HalfPageUp),
            KeyCode::Char('d') | KeyCode::PageDown => Some(Action::HalfPageDown),
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char('n') => Some(Action::NextMatch),
            KeyCode::Char('N') => Some(Action::PrevMatch),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Back),
            _ => None,
        },
        Mode::ListSearchInput | Mode::DetailSearchInput => match key.code {
            KeyCode::Enter => Some(Action::SubmitInput),
            KeyCode::Esc => Some(Action::CancelInput),
            KeyCode::Backspace => Some(Action::InputBackspace),
            KeyCode::Char(c) => Some(Action::InputChar(c)),
            _ => None,
        },
    }
}
