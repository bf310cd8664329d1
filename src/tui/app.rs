//! Navigation state machine.
//!
//! [`App::update`] is the single place state changes. Input actions and the
//! results of background work both arrive as [`Event`]s; anything that needs
//! I/O goes back out as an [`Effect`] for the runtime to execute. Results are
//! applied in the order they are dequeued, so every result carries enough
//! identity (listing, page, ticket) to be recognised as stale.

use crate::error::{Error, Result};
use crate::index::{IndexReport, Progress};
use crate::pages::{PageEntry, SectionFilter, apply_filters, default_filters};
use crate::query::{MatchCursor, SearchResult, Suggestion, find_matching_lines, suggest};
use rustc_hash::FxHashMap;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Detail,
    ListSearchInput,
    DetailSearchInput,
}

/// Which listing the list view is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Every installed page
    All,
    /// Keyword search results
    Query(String),
    /// Full-text results handed over at launch
    Deep(String),
}

/// Origin of an error shown in the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Listing,
    /// Background full enumeration behind a keyword listing
    Catalog,
    Content,
    Preview,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotError {
    pub slot: Slot,
    pub message: String,
}

/// User intent, already resolved from raw keys for the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Open,
    Back,
    StartSearch,
    ToggleSection(char),
    Refresh,
    RebuildIndex,
    CancelRebuild,
    ScrollUp,
    ScrollDown,
    Top,
    Bottom,
    HalfPageUp,
    HalfPageDown,
    NextMatch,
    PrevMatch,
    InputChar(char),
    InputBackspace,
    SubmitInput,
    CancelInput,
    Quit,
}

#[derive(Debug)]
pub enum Event {
    Input(Action),
    /// Rows available for page text in detail mode
    Resize { viewport_height: usize },
    PagesLoaded {
        listing: Listing,
        result: Result<Vec<PageEntry>>,
    },
    ContentLoaded {
        page: PageEntry,
        result: Result<String>,
    },
    PreviewLoaded {
        ticket: u64,
        page: PageEntry,
        result: Result<String>,
    },
    IndexProgress(Progress),
    IndexRebuilt(Result<IndexReport>),
}

/// Work requested from the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ListPages,
    SearchPages { query: String },
    LoadContent { page: PageEntry },
    LoadPreview { page: PageEntry, ticket: u64 },
    RebuildIndex,
    CancelRebuild,
    Quit,
}

/// Application state
#[derive(Debug)]
pub struct App {
    pub mode: Mode,
    /// Requested listing; results for any other listing are stale
    pub listing: Listing,
    /// Entries of the current listing
    pub catalog: Vec<PageEntry>,
    /// Full enumeration, the candidate set for suggestions
    pub all_pages: Vec<PageEntry>,
    all_loaded: bool,
    pub filtered: Vec<PageEntry>,
    pub suggestions: Vec<Suggestion>,
    pub filters: Vec<SectionFilter>,
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<SlotError>,
    pub status: String,

    pub preview: Option<String>,
    preview_ticket: u64,
    /// Excerpts by doc ID, shown instead of a fetched preview
    excerpts: FxHashMap<String, String>,

    pub detail_page: Option<PageEntry>,
    pub detail: Option<String>,
    pending_open: Option<PageEntry>,
    pub scroll: usize,
    pub viewport_height: usize,

    pub input: String,
    pub doc_query: String,
    pub matches: MatchCursor,

    /// Query whose outcome has not been applied yet
    initial_query: Option<String>,
    /// Zero-match query waiting for the full enumeration
    pending_suggestions: Option<String>,

    /// Some while an index rebuild runs
    pub indexing: Option<Progress>,
    pub should_quit: bool,
}

impl App {
    fn blank(listing: Listing) -> Self {
        Self {
            mode: Mode::List,
            listing,
            catalog: Vec::new(),
            all_pages: Vec::new(),
            all_loaded: false,
            filtered: Vec::new(),
            suggestions: Vec::new(),
            filters: default_filters(),
            cursor: 0,
            loading: true,
            error: None,
            status: String::new(),
            preview: None,
            preview_ticket: 0,
            excerpts: FxHashMap::default(),
            detail_page: None,
            detail: None,
            pending_open: None,
            scroll: 0,
            viewport_height: 20,
            input: String::new(),
            doc_query: String::new(),
            matches: MatchCursor::default(),
            initial_query: None,
            pending_suggestions: None,
            indexing: None,
            should_quit: false,
        }
    }

    /// Browse all pages, optionally starting from a keyword query
    pub fn new(initial_query: Option<String>) -> (Self, Vec<Effect>) {
        match initial_query.filter(|q| !q.trim().is_empty()) {
            Some(query) => {
                let mut app = Self::blank(Listing::Query(query.clone()));
                app.status = format!("Searching for '{}'...", query);
                app.initial_query = Some(query.clone());
                (app, vec![Effect::SearchPages { query }, Effect::ListPages])
            }
            None => {
                let mut app = Self::blank(Listing::All);
                app.status = "Loading pages...".to_string();
                (app, vec![Effect::ListPages])
            }
        }
    }

    /// Browse the results of a full-text query
    pub fn with_search_results(query: String, results: Vec<SearchResult>) -> (Self, Vec<Effect>) {
        let mut app = Self::blank(Listing::Deep(query.clone()));
        let mut effects = vec![Effect::ListPages];
        app.loading = false;

        if results.is_empty() {
            app.pending_suggestions = Some(query.clone());
            app.status = format!("No full-text matches for '{}'", query);
            return (app, effects);
        }

        app.excerpts = results
            .iter()
            .map(|r| {
                let text = if r.excerpts.is_empty() {
                    r.highlight.clone()
                } else {
                    r.excerpts.join("\n\n---\n\n")
                };
                (r.page.doc_id(), text)
            })
            .collect();
        app.status = format!("{} full-text matches for '{}'", results.len(), query);
        let pages = results.into_iter().map(|r| r.page).collect();
        app.set_catalog(pages);
        effects.extend(app.request_preview());
        (app, effects)
    }

    /// Apply one event and return the work it requires
    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Input(action) => self.handle_action(action),
            Event::Resize { viewport_height } => {
                self.viewport_height = viewport_height.max(1);
                self.scroll = self.scroll.min(self.max_scroll());
                Vec::new()
            }
            Event::PagesLoaded { listing, result } => self.on_pages_loaded(listing, result),
            Event::ContentLoaded { page, result } => {
                self.on_content_loaded(page, result);
                Vec::new()
            }
            Event::PreviewLoaded {
                ticket,
                page,
                result,
            } => {
                self.on_preview_loaded(ticket, page, result);
                Vec::new()
            }
            Event::IndexProgress(progress) => {
                if self.indexing.is_some() {
                    self.indexing = Some(progress);
                }
                Vec::new()
            }
            Event::IndexRebuilt(result) => {
                self.on_index_rebuilt(result);
                Vec::new()
            }
        }
    }

    /// True when the list shows suggestions because nothing else is visible
    pub fn showing_suggestions(&self) -> bool {
        self.filtered.is_empty() && !self.suggestions.is_empty()
    }

    /// Length of the list the cursor indexes
    pub fn visible_len(&self) -> usize {
        if self.showing_suggestions() {
            self.suggestions.len()
        } else {
            self.filtered.len()
        }
    }

    /// Entry under the cursor
    pub fn selected(&self) -> Option<&PageEntry> {
        if self.showing_suggestions() {
            self.suggestions.get(self.cursor).map(|s| &s.page)
        } else {
            self.filtered.get(self.cursor)
        }
    }

    /// Largest scroll offset that still fills the viewport
    pub fn max_scroll(&self) -> usize {
        let lines = self.detail.as_deref().map_or(0, |d| d.lines().count());
        lines.saturating_sub(self.viewport_height)
    }

    fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        if action == Action::Quit {
            self.should_quit = true;
            return vec![Effect::Quit];
        }

        match self.mode {
            Mode::List => self.list_action(action),
            Mode::Detail => self.detail_action(action),
            Mode::ListSearchInput | Mode::DetailSearchInput => self.input_action(action),
        }
    }

    fn list_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Up => self.move_cursor(self.cursor.saturating_sub(1)),
            Action::Down => self.move_cursor(self.cursor + 1),
            Action::Open => self.open_selected(),
            Action::StartSearch => {
                self.mode = Mode::ListSearchInput;
                self.input.clear();
                Vec::new()
            }
            Action::ToggleSection(code) => {
                let Some(filter) = self.filters.iter_mut().find(|f| f.code == code) else {
                    return Vec::new();
                };
                filter.enabled = !filter.enabled;
                self.refilter();
                self.request_preview()
            }
            Action::Refresh => {
                self.forget_initial_query();
                self.listing = Listing::All;
                self.loading = true;
                self.excerpts.clear();
                self.status = "Loading pages...".to_string();
                vec![Effect::ListPages]
            }
            Action::RebuildIndex => {
                if self.indexing.is_some() {
                    return Vec::new();
                }
                self.indexing = Some(Progress {
                    processed: 0,
                    indexed: 0,
                    total: 0,
                });
                self.status = "Rebuilding index...".to_string();
                vec![Effect::RebuildIndex]
            }
            Action::CancelRebuild => {
                if self.indexing.is_none() {
                    return Vec::new();
                }
                self.status = "Cancelling index rebuild...".to_string();
                vec![Effect::CancelRebuild]
            }
            _ => Vec::new(),
        }
    }

    fn detail_action(&mut self, action: Action) -> Vec<Effect> {
        let half_page = (self.viewport_height / 2).max(1);
        match action {
            Action::Back => {
                self.mode = Mode::List;
                self.pending_open = None;
                self.detail = None;
                self.detail_page = None;
                self.scroll = 0;
                self.doc_query.clear();
                self.matches = MatchCursor::default();
            }
            Action::ScrollUp | Action::Up => self.scroll = self.scroll.saturating_sub(1),
            Action::ScrollDown | Action::Down => self.scroll_to(self.scroll + 1),
            Action::Top => self.scroll = 0,
            Action::Bottom => self.scroll = self.max_scroll(),
            Action::HalfPageUp => self.scroll = self.scroll.saturating_sub(half_page),
            Action::HalfPageDown => self.scroll_to(self.scroll + half_page),
            Action::StartSearch => {
                self.mode = Mode::DetailSearchInput;
                self.input.clear();
            }
            Action::NextMatch => {
                if let Some(line) = self.matches.next() {
                    self.scroll_to(line);
                }
            }
            Action::PrevMatch => {
                if let Some(line) = self.matches.prev() {
                    self.scroll_to(line);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn input_action(&mut self, action: Action) -> Vec<Effect> {
        let in_list = self.mode == Mode::ListSearchInput;
        match action {
            Action::InputChar(c) => self.input.push(c),
            Action::InputBackspace => {
                self.input.pop();
            }
            Action::CancelInput => {
                self.input.clear();
                self.mode = if in_list { Mode::List } else { Mode::Detail };
            }
            Action::SubmitInput => {
                let query = std::mem::take(&mut self.input).trim().to_string();
                if in_list {
                    self.mode = Mode::List;
                    if !query.is_empty() {
                        self.forget_initial_query();
                        self.listing = Listing::Query(query.clone());
                        self.loading = true;
                        self.status = format!("Searching for '{}'...", query);
                        return vec![Effect::SearchPages { query }];
                    }
                } else {
                    self.mode = Mode::Detail;
                    self.search_detail(query);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    /// A new listing request supersedes a startup query that has not resolved
    fn forget_initial_query(&mut self) {
        self.initial_query = None;
        self.pending_suggestions = None;
    }

    fn search_detail(&mut self, query: String) {
        let lines = match &self.detail {
            Some(text) if !query.is_empty() => find_matching_lines(text, &query),
            _ => Vec::new(),
        };
        self.matches = MatchCursor::new(lines);
        if let Some(line) = self.matches.current_line() {
            self.scroll_to(line);
        }
        self.status = if query.is_empty() {
            String::new()
        } else if self.matches.is_empty() {
            format!("Pattern not found: {}", query)
        } else {
            format!("{} matches for '{}'", self.matches.len(), query)
        };
        self.doc_query = query;
    }

    fn scroll_to(&mut self, line: usize) {
        self.scroll = line.min(self.max_scroll());
    }

    fn move_cursor(&mut self, target: usize) -> Vec<Effect> {
        let len = self.visible_len();
        if len == 0 {
            return Vec::new();
        }
        let target = target.min(len - 1);
        if target == self.cursor {
            return Vec::new();
        }
        self.cursor = target;
        self.request_preview()
    }

    fn open_selected(&mut self) -> Vec<Effect> {
        let Some(page) = self.selected().cloned() else {
            return Vec::new();
        };
        self.open(page)
    }

    fn open(&mut self, page: PageEntry) -> Vec<Effect> {
        self.mode = Mode::Detail;
        self.detail = None;
        self.detail_page = Some(page.clone());
        self.scroll = 0;
        self.doc_query.clear();
        self.matches = MatchCursor::default();
        self.loading = true;
        self.pending_open = Some(page.clone());
        vec![Effect::LoadContent { page }]
    }

    /// Fetch a preview for the selected entry, superseding any earlier one
    fn request_preview(&mut self) -> Vec<Effect> {
        self.preview_ticket += 1;
        let Some(page) = self.selected().cloned() else {
            self.preview = None;
            return Vec::new();
        };

        if let Some(text) = self.excerpts.get(&page.doc_id()) {
            self.preview = Some(text.clone());
            return Vec::new();
        }

        self.preview = None;
        vec![Effect::LoadPreview {
            page,
            ticket: self.preview_ticket,
        }]
    }

    fn set_catalog(&mut self, pages: Vec<PageEntry>) {
        self.catalog = pages;
        self.suggestions.clear();
        self.cursor = 0;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.catalog, &self.filters);
        self.cursor = self.cursor.min(self.visible_len().saturating_sub(1));
    }

    fn on_pages_loaded(&mut self, listing: Listing, result: Result<Vec<PageEntry>>) -> Vec<Effect> {
        let current = listing == self.listing;
        let full = listing == Listing::All;

        if !current && !full {
            tracing::trace!(?listing, "Dropping stale listing");
            return Vec::new();
        }

        let pages = match result {
            Ok(pages) => pages,
            Err(e) if current => {
                self.set_error(Slot::Listing, &e);
                return Vec::new();
            }
            Err(e) => {
                // The requested listing is still on its way
                self.record_error(Slot::Catalog, &e);
                return Vec::new();
            }
        };

        let mut effects = Vec::new();

        if full {
            self.all_pages = pages.clone();
            self.all_loaded = true;
            self.clear_error(Slot::Catalog);
        }

        if current {
            self.loading = false;
            self.clear_error(Slot::Listing);
            self.status = match &listing {
                Listing::All => format!("{} pages", pages.len()),
                Listing::Query(q) | Listing::Deep(q) => {
                    format!("{} pages matching '{}'", pages.len(), q)
                }
            };
            self.set_catalog(pages);

            match self.initial_query.take() {
                Some(query) => effects.extend(self.apply_initial_outcome(query)),
                None => {
                    if self.mode == Mode::List {
                        effects.extend(self.request_preview());
                    }
                }
            }
        }

        if self.all_loaded
            && let Some(query) = self.pending_suggestions.take()
        {
            effects.extend(self.show_suggestions(&query));
        }

        effects
    }

    /// Zero matches suggest, one match opens, more just list
    fn apply_initial_outcome(&mut self, query: String) -> Vec<Effect> {
        match self.catalog.len() {
            0 => {
                if self.all_loaded {
                    self.show_suggestions(&query)
                } else {
                    self.pending_suggestions = Some(query);
                    Vec::new()
                }
            }
            1 => {
                let page = self.catalog[0].clone();
                self.open(page)
            }
            _ => self.request_preview(),
        }
    }

    fn show_suggestions(&mut self, query: &str) -> Vec<Effect> {
        if !self.catalog.is_empty() {
            return Vec::new();
        }
        self.suggestions = suggest(query, &self.all_pages);
        self.cursor = 0;
        self.status = if self.suggestions.is_empty() {
            format!("Nothing matches '{}'", query)
        } else {
            format!("Nothing matches '{}'; closest pages shown", query)
        };
        if self.mode == Mode::List {
            self.request_preview()
        } else {
            Vec::new()
        }
    }

    fn on_content_loaded(&mut self, page: PageEntry, result: Result<String>) {
        if self.pending_open.as_ref() != Some(&page) {
            tracing::trace!(page = %page.doc_id(), "Dropping stale content");
            return;
        }
        self.pending_open = None;
        match result {
            Ok(text) => {
                self.loading = false;
                self.clear_error(Slot::Content);
                self.detail = Some(text);
                self.scroll = 0;
            }
            Err(e) => self.set_error(Slot::Content, &e),
        }
    }

    fn on_preview_loaded(&mut self, ticket: u64, page: PageEntry, result: Result<String>) {
        if ticket != self.preview_ticket {
            tracing::trace!(page = %page.doc_id(), ticket, "Dropping stale preview");
            return;
        }
        match result {
            Ok(text) => {
                self.clear_error(Slot::Preview);
                self.preview = Some(text);
            }
            Err(e) => {
                self.preview = None;
                self.set_error(Slot::Preview, &e);
            }
        }
    }

    fn on_index_rebuilt(&mut self, result: Result<IndexReport>) {
        self.indexing = None;
        match result {
            Ok(report) => {
                self.clear_error(Slot::Index);
                self.status = format!(
                    "Indexed {} pages ({} failed)",
                    report.indexed,
                    report.failed()
                );
            }
            Err(Error::Cancelled) => self.status = "Index rebuild cancelled".to_string(),
            Err(e) => self.set_error(Slot::Index, &e),
        }
    }

    fn set_error(&mut self, slot: Slot, error: &Error) {
        self.loading = false;
        self.record_error(slot, error);
    }

    fn record_error(&mut self, slot: Slot, error: &Error) {
        tracing::warn!(?slot, error = %error, "Request failed");
        self.error = Some(SlotError {
            slot,
            message: error.to_string(),
        });
    }

    fn clear_error(&mut self, slot: Slot) {
        if self.error.as_ref().is_some_and(|e| e.slot == slot) {
            self.error = None;
        }
    }
}
