pub mod app;
pub mod keys;
pub mod runtime;
pub mod theme;
pub mod ui;

use crate::index::BuildOptions;
use crate::pages::PageSource;
use crate::query::SearchResult;
use crate::utils::AppConfig;
use anyhow::Result;
use app::{App, Effect, Event as AppEvent};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use runtime::Runtime;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use theme::Theme;

/// How the browser starts
pub enum Launch {
    /// All pages, optionally narrowed by a keyword query
    Browse(Option<String>),
    /// Results of a full-text query
    Search {
        query: String,
        results: Vec<SearchResult>,
    },
}

pub fn run(source: Arc<dyn PageSource>, config: &AppConfig, launch: Launch) -> Result<()> {
    let (app, effects) = match launch {
        Launch::Browse(query) => App::new(query),
        Launch::Search { query, results } => App::with_search_results(query, results),
    };

    let (tx, rx) = mpsc::channel();
    let mut runtime = Runtime::new(
        source,
        tx,
        config.index_path()?,
        BuildOptions::from_config(config),
        config.page_cache_size,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, app, effects, &mut runtime, &rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    effects: Vec<Effect>,
    runtime: &mut Runtime,
    events: &Receiver<AppEvent>,
) -> Result<()> {
    let theme = Theme::default();
    runtime.dispatch(effects);

    let size = terminal.size()?;
    let effects = app.update(AppEvent::Resize {
        viewport_height: ui::detail_viewport_height(size.height),
    });
    runtime.dispatch(effects);

    loop {
        // Apply finished background work (non-blocking)
        while let Ok(event) = events.try_recv() {
            let effects = app.update(event);
            if !runtime.dispatch(effects) {
                return Ok(());
            }
        }

        terminal.draw(|f| ui::draw(f, &app, &theme))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        let event = match event::read()? {
            // Only handle key press events, not release or repeat
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match keys::action_for(app.mode, key) {
                    Some(action) => AppEvent::Input(action),
                    None => continue,
                }
            }
            Event::Resize(_, height) => AppEvent::Resize {
                viewport_height: ui::detail_viewport_height(height),
            },
            _ => continue,
        };

        let effects = app.update(event);
        if !runtime.dispatch(effects) || app.should_quit {
            return Ok(());
        }
    }
}
