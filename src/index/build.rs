//! Parallel index rebuild.
//!
//! A feeder thread pushes catalog entries into a bounded work queue that a
//! fixed rayon pool of fetch workers drains. Fetched documents flow through a
//! bounded results queue to the coordinator, which is the only writer to the
//! index. The thread running the pool scope doubles as the completion
//! watcher: it drops the last results sender once every worker has returned,
//! which is what ends the coordinator's drain loop.

use crate::error::{Error, Result};
use crate::index::engine::PageIndexWriter;
use crate::index::types::{BuildOptions, IndexDocument, IndexReport, Progress};
use crate::pages::{PageEntry, PageSource};
use crate::utils::CancelToken;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// How long the coordinator waits on the results queue before rechecking
/// cancellation and progress.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Destination for committed batches
pub trait BatchSink {
    fn commit_batch(&mut self, batch: Vec<IndexDocument>) -> Result<()>;
}

/// Destroy and rebuild the index at `location` from `catalog`.
///
/// Index creation happens before any worker starts, so a creation failure
/// leaves no fetch work behind.
pub fn rebuild_index<S>(
    location: &Path,
    catalog: &[PageEntry],
    source: &S,
    opts: &BuildOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<IndexReport>
where
    S: PageSource + ?Sized,
{
    let mut writer = PageIndexWriter::create(location)?;
    let report = run_pipeline(catalog, source, &mut writer, opts, cancel, progress)?;
    writer.finish()?;
    Ok(report)
}

/// Fetch every catalog entry in parallel and commit the documents to `sink`
/// in batches of `opts.batch_size`.
///
/// Fetch failures are logged and counted but never abort the run. A commit
/// failure or cancellation does.
pub fn run_pipeline<S, K>(
    catalog: &[PageEntry],
    source: &S,
    sink: &mut K,
    opts: &BuildOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<IndexReport>
where
    S: PageSource + ?Sized,
    K: BatchSink + ?Sized,
{
    let started = Instant::now();
    let total = catalog.len();
    let workers = opts.workers.max(1);
    let queue_capacity = opts.queue_capacity.max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mandex-fetch-{}", i))
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    tracing::info!(total, workers, batch_size = opts.batch_size, "Indexing started");

    let processed = AtomicUsize::new(0);
    let (work_tx, work_rx) = bounded::<&PageEntry>(queue_capacity);
    let (result_tx, result_rx) = bounded::<IndexDocument>(queue_capacity);

    let outcome = thread::scope(|scope| {
        let processed = &processed;
        let pool = &pool;

        scope.spawn(move || {
            for page in catalog {
                if cancel.is_cancelled() || work_tx.send(page).is_err() {
                    break;
                }
            }
        });

        scope.spawn(move || {
            pool.scope(|s| {
                for _ in 0..workers {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    s.spawn(move |_| fetch_worker(source, &work_rx, &result_tx, processed, cancel));
                }
            });
            drop(result_tx);
        });

        drain_results(result_rx, sink, opts, cancel, processed, total, progress)
    });

    let report = outcome?;
    tracing::info!(
        indexed = report.indexed,
        failed = report.failed(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Indexing finished"
    );
    Ok(report)
}

fn fetch_worker<S>(
    source: &S,
    work: &Receiver<&PageEntry>,
    results: &Sender<IndexDocument>,
    processed: &AtomicUsize,
    cancel: &CancelToken,
) where
    S: PageSource + ?Sized,
{
    for page in work.iter() {
        if cancel.is_cancelled() {
            break;
        }

        let fetched = match &page.path {
            Some(path) => source
                .raw_content(path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            None => source.content(&page.name, Some(&page.section)),
        };
        processed.fetch_add(1, Ordering::Relaxed);

        match fetched {
            Ok(content) => {
                if results.send(IndexDocument::from_page(page, content)).is_err() {
                    // Coordinator gave up
                    break;
                }
            }
            Err(e) => tracing::debug!(page = %page.doc_id(), error = %e, "Skipping page"),
        }
    }
}

/// Coordinator loop. Owns the results receiver so that returning early
/// disconnects the queue and unblocks any worker waiting to send.
fn drain_results<K>(
    results: Receiver<IndexDocument>,
    sink: &mut K,
    opts: &BuildOptions,
    cancel: &CancelToken,
    processed: &AtomicUsize,
    total: usize,
    progress: &mut dyn FnMut(Progress),
) -> Result<IndexReport>
where
    K: BatchSink + ?Sized,
{
    let batch_size = opts.batch_size.max(1);
    let progress_every = opts.progress_every.max(1);

    let mut batch = Vec::with_capacity(batch_size);
    let mut indexed = 0;
    let mut next_report = progress_every;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(indexed, "Indexing cancelled");
            return Err(Error::Cancelled);
        }

        match results.recv_timeout(POLL_INTERVAL) {
            Ok(doc) => {
                batch.push(doc);
                if batch.len() >= batch_size {
                    indexed += commit(sink, &mut batch)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let done = processed.load(Ordering::Relaxed);
        if done >= next_report {
            progress(Progress {
                processed: done,
                indexed,
                total,
            });
            next_report = (done / progress_every + 1) * progress_every;
        }
    }

    // Workers may have stopped early on a late cancel
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    if !batch.is_empty() {
        indexed += commit(sink, &mut batch)?;
    }

    let processed = processed.load(Ordering::Relaxed);
    progress(Progress {
        processed,
        indexed,
        total,
    });

    Ok(IndexReport { indexed, processed })
}

fn commit<K>(sink: &mut K, batch: &mut Vec<IndexDocument>) -> Result<usize>
where
    K: BatchSink + ?Sized,
{
    let docs = std::mem::take(batch);
    let count = docs.len();
    sink.commit_batch(docs)?;
    tracing::debug!(count, "Committed batch");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    impl BatchSink for Vec<Vec<IndexDocument>> {
        fn commit_batch(&mut self, batch: Vec<IndexDocument>) -> Result<()> {
            self.push(batch);
            Ok(())
        }
    }

    /// Serves synthetic pages; paths listed in `failing` return an error.
    struct FakeSource {
        failing: HashSet<PathBuf>,
        cancel_after: Option<(usize, CancelToken)>,
        fetched: AtomicUsize,
    }

    impl FakeSource {
        fn new(failing: impl IntoIterator<Item = PathBuf>) -> Self {
            Self {
                failing: failing.into_iter().collect(),
                cancel_after: None,
                fetched: AtomicUsize::new(0),
            }
        }
    }

    impl PageSource for FakeSource {
        fn list(&self) -> Result<Vec<PageEntry>> {
            Ok(Vec::new())
        }

        fn search(&self, _query: &str) -> Result<Vec<PageEntry>> {
            Ok(Vec::new())
        }

        fn content(&self, name: &str, section: Option<&str>) -> Result<String> {
            Ok(format!("{} formatted in {}", name, section.unwrap_or("?")))
        }

        fn raw_content(&self, path: &Path) -> Result<Vec<u8>> {
            let n = self.fetched.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, token)) = &self.cancel_after
                && n >= *limit
            {
                token.cancel();
            }
            if self.failing.contains(path) {
                return Err(Error::DocumentFetch {
                    id: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                });
            }
            Ok(format!("raw page at {}", path.display()).into_bytes())
        }
    }

    fn catalog(n: usize) -> Vec<PageEntry> {
        (0..n)
            .map(|i| PageEntry::new(format!("page{}", i), "3").with_path(format!("/man/page{}.3", i)))
            .collect()
    }

    fn opts(workers: usize, batch_size: usize) -> BuildOptions {
        BuildOptions {
            workers,
            batch_size,
            queue_capacity: 16,
            progress_every: 100,
        }
    }

    #[test]
    fn test_partial_failures_are_counted() {
        let pages = catalog(250);
        let failing = pages.iter().step_by(25).filter_map(|p| p.path.clone());
        let source = FakeSource::new(failing);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        let report = run_pipeline(
            &pages,
            &source,
            &mut sink,
            &opts(8, 100),
            &CancelToken::new(),
            &mut |_| {},
        )
        .unwrap();

        assert_eq!(report.processed, 250);
        assert_eq!(report.indexed, 240);
        assert_eq!(report.failed(), 10);
        assert_eq!(sink.iter().map(Vec::len).sum::<usize>(), 240);
    }

    #[test]
    fn test_batches_fill_before_commit() {
        let pages = catalog(250);
        let source = FakeSource::new([]);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        run_pipeline(&pages, &source, &mut sink, &opts(4, 100), &CancelToken::new(), &mut |_| {})
            .unwrap();

        let sizes: Vec<usize> = sink.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn test_every_page_indexed_once() {
        let pages = catalog(120);
        let source = FakeSource::new([]);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        run_pipeline(&pages, &source, &mut sink, &opts(6, 7), &CancelToken::new(), &mut |_| {})
            .unwrap();

        let ids: HashSet<String> = sink.iter().flatten().map(IndexDocument::doc_id).collect();
        assert_eq!(ids.len(), 120);
        assert!(ids.contains("page0(3)"));
        assert!(ids.contains("page119(3)"));
    }

    #[test]
    fn test_entries_without_path_use_formatter() {
        let pages = vec![PageEntry::new("printf", "3")];
        let source = FakeSource::new([]);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        let report =
            run_pipeline(&pages, &source, &mut sink, &opts(1, 10), &CancelToken::new(), &mut |_| {})
                .unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(sink[0][0].content, "printf formatted in 3");
        assert_eq!(source.fetched.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_progress_reported() {
        let pages = catalog(250);
        let source = FakeSource::new([]);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();
        let mut seen = Vec::new();

        run_pipeline(&pages, &source, &mut sink, &opts(4, 50), &CancelToken::new(), &mut |p| {
            seen.push(p)
        })
        .unwrap();

        let last = seen.last().unwrap();
        assert_eq!(last.processed, 250);
        assert_eq!(last.indexed, 250);
        assert_eq!(last.total, 250);
        assert!(seen.windows(2).all(|w| w[0].processed <= w[1].processed));
    }

    #[test]
    fn test_cancellation_stops_rebuild() {
        let pages = catalog(500);
        let token = CancelToken::new();
        let mut source = FakeSource::new([]);
        source.cancel_after = Some((5, token.clone()));
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        let result = run_pipeline(&pages, &source, &mut sink, &opts(2, 10), &token, &mut |_| {});

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(source.fetched.load(Ordering::SeqCst) < 500);
    }

    #[test]
    fn test_commit_failure_aborts() {
        struct FailingSink;
        impl BatchSink for FailingSink {
            fn commit_batch(&mut self, _batch: Vec<IndexDocument>) -> Result<()> {
                Err(Error::IndexWrite("disk full".to_string()))
            }
        }

        let pages = catalog(300);
        let source = FakeSource::new([]);
        let result = run_pipeline(
            &pages,
            &source,
            &mut FailingSink,
            &opts(4, 10),
            &CancelToken::new(),
            &mut |_| {},
        );

        assert!(matches!(result, Err(Error::IndexWrite(_))));
    }

    #[test]
    fn test_empty_catalog() {
        let source = FakeSource::new([]);
        let mut sink: Vec<Vec<IndexDocument>> = Vec::new();

        let report =
            run_pipeline(&[], &source, &mut sink, &opts(4, 10), &CancelToken::new(), &mut |_| {})
                .unwrap();

        assert_eq!(report, IndexReport::default());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_create_failure_aborts_before_fetching() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let pages = catalog(20);
        let source = FakeSource::new([]);
        let mut reported = 0;

        let result = rebuild_index(
            &blocker.join("index"),
            &pages,
            &source,
            &opts(4, 10),
            &CancelToken::new(),
            &mut |_| reported += 1,
        );

        assert!(matches!(result, Err(Error::IndexCreate { .. })));
        assert_eq!(source.fetched.load(Ordering::SeqCst), 0);
        assert_eq!(reported, 0);
    }
}
