//! Effect execution for the browser.
//!
//! Every effect runs on its own background thread and reports back with
//! exactly one [`Event`] on the channel the UI loop drains. The runtime never
//! touches application state.

use crate::error::Result;
use crate::index::{BuildOptions, rebuild_index};
use crate::pages::{PageEntry, PageSource};
use crate::tui::app::{Effect, Event, Listing};
use crate::utils::CancelToken;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;

type PageCache = Arc<Mutex<LruCache<String, String>>>;

pub struct Runtime {
    source: Arc<dyn PageSource>,
    events: Sender<Event>,
    /// Rendered page text by doc ID
    cache: PageCache,
    index_location: PathBuf,
    build_options: BuildOptions,
    preview_cancel: Option<CancelToken>,
    rebuild_cancel: Option<CancelToken>,
}

impl Runtime {
    pub fn new(
        source: Arc<dyn PageSource>,
        events: Sender<Event>,
        index_location: PathBuf,
        build_options: BuildOptions,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            events,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            index_location,
            build_options,
            preview_cancel: None,
            rebuild_cancel: None,
        }
    }

    /// Run all effects. Returns false once a quit was requested.
    pub fn dispatch(&mut self, effects: Vec<Effect>) -> bool {
        let mut running = true;
        for effect in effects {
            running &= self.execute(effect);
        }
        running
    }

    fn execute(&mut self, effect: Effect) -> bool {
        tracing::trace!(?effect, "Dispatching effect");
        match effect {
            Effect::ListPages => {
                let source = Arc::clone(&self.source);
                self.spawn(move || Event::PagesLoaded {
                    listing: Listing::All,
                    result: source.list(),
                });
            }
            Effect::SearchPages { query } => {
                let source = Arc::clone(&self.source);
                self.spawn(move || {
                    let result = source.search(&query);
                    Event::PagesLoaded {
                        listing: Listing::Query(query),
                        result,
                    }
                });
            }
            Effect::LoadContent { page } => {
                let source = Arc::clone(&self.source);
                let cache = Arc::clone(&self.cache);
                self.spawn(move || {
                    let result = load_cached(source.as_ref(), &cache, &page);
                    Event::ContentLoaded { page, result }
                });
            }
            Effect::LoadPreview { page, ticket } => {
                if let Some(previous) = self.preview_cancel.take() {
                    previous.cancel();
                }
                let token = CancelToken::new();
                self.preview_cancel = Some(token.clone());

                let source = Arc::clone(&self.source);
                let cache = Arc::clone(&self.cache);
                let events = self.events.clone();
                thread::spawn(move || {
                    if token.is_cancelled() {
                        return;
                    }
                    let result = load_cached(source.as_ref(), &cache, &page);
                    if token.is_cancelled() {
                        return;
                    }
                    let _ = events.send(Event::PreviewLoaded {
                        ticket,
                        page,
                        result,
                    });
                });
            }
            Effect::RebuildIndex => self.start_rebuild(),
            Effect::CancelRebuild => {
                if let Some(token) = &self.rebuild_cancel {
                    token.cancel();
                }
            }
            Effect::Quit => return false,
        }
        true
    }

    fn start_rebuild(&mut self) {
        let token = CancelToken::new();
        self.rebuild_cancel = Some(token.clone());

        let source = Arc::clone(&self.source);
        let location = self.index_location.clone();
        let options = self.build_options;
        let events = self.events.clone();

        thread::spawn(move || {
            let progress_events = events.clone();
            let mut report = |progress| {
                let _ = progress_events.send(Event::IndexProgress(progress));
            };
            let result = source.list().and_then(|catalog| {
                rebuild_index(
                    &location,
                    &catalog,
                    source.as_ref(),
                    &options,
                    &token,
                    &mut report,
                )
            });
            let _ = events.send(Event::IndexRebuilt(result));
        });
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() -> Event + Send + 'static,
    {
        let events = self.events.clone();
        thread::spawn(move || {
            // Receiver is gone once the UI has exited
            let _ = events.send(job());
        });
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Some(token) = &self.rebuild_cancel {
            token.cancel();
        }
    }
}

fn load_cached(source: &dyn PageSource, cache: &PageCache, page: &PageEntry) -> Result<String> {
    let key = page.doc_id();
    if let Ok(mut cache) = cache.lock()
        && let Some(text) = cache.get(&key)
    {
        return Ok(text.clone());
    }

    let text = source.content(&page.name, Some(&page.section))?;
    if let Ok(mut cache) = cache.lock() {
        cache.put(key, text.clone());
    }
    Ok(text)
}
