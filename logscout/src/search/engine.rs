use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::events::{EventSink, SearchEvent};
use super::matcher::CompiledExpression;
use super::pool::{Priority, WorkerPool};
use super::run::SearchRun;
use super::scanner::shallow_scan;
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::results::ResultStore;
use crate::source::{FileOpener, TextLogOpener};

/// Runs two-phase searches over a set of log files and reports progress on a
/// channel.
///
/// ```rust,ignore
/// let engine = SearchEngine::new(&config)?;
/// let events = engine.events();
/// engine.search(paths, "(link down)|(timeout)")?;
///
/// for event in events.iter() {
///     match event {
///         SearchEvent::FoundFile { index } => {
///             let record = engine.results().at(index).unwrap();
///             println!("{}", record.path().display());
///         }
///         SearchEvent::SearchFinished => break,
///         _ => {}
///     }
/// }
/// ```
///
/// Only one search is active at a time; starting a search fully cancels the
/// previous one.
pub struct SearchEngine {
    pool: WorkerPool,
    opener: Arc<dyn FileOpener>,
    events: Arc<EventSink>,
    current: Mutex<Option<Arc<SearchRun>>>,
    no_results: Arc<ResultStore>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("pool", &self.pool)
            .field("running", &self.is_running())
            .field("subscribers", &self.events.subscriber_count())
            .finish()
    }
}

impl SearchEngine {
    /// Creates an engine that reads text log files from disk
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        Self::with_opener(
            config.thread_count.get(),
            Arc::new(TextLogOpener::new(config.encoding_mode)),
        )
    }

    /// Creates an engine with `thread_count` workers (at least two) that opens
    /// files through `opener`
    pub fn with_opener(thread_count: usize, opener: Arc<dyn FileOpener>) -> SearchResult<Self> {
        Ok(Self {
            pool: WorkerPool::new(thread_count)?,
            opener,
            events: Arc::new(EventSink::new()),
            current: Mutex::new(None),
            no_results: Arc::new(ResultStore::new()),
        })
    }

    /// Subscribes to progress events.
    ///
    /// Every receiver gets every event emitted after it was created, queued
    /// until it is read. Events emitted while nobody is subscribed are
    /// dropped, and dropping a receiver ends its subscription.
    pub fn events(&self) -> Receiver<SearchEvent> {
        self.events.subscribe()
    }

    /// Effective worker pool size
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Starts searching `paths` for `expression` (case-insensitive).
    ///
    /// Fails without side effects when there are no paths, the expression is
    /// blank, or the expression does not compile. Otherwise any previous
    /// search is fully cancelled, `Started` is emitted, and half the pool is
    /// put to work on the paths in the order given.
    ///
    /// `Stopped { full_stop: true }` precedes `Started` only when a previous
    /// search is replaced; the first search of an engine emits no `Stopped`.
    pub fn search<I, P>(&self, paths: I, expression: &str) -> SearchResult<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(SearchError::config_error("no paths to search"));
        }
        if expression.trim().is_empty() {
            return Err(SearchError::config_error("empty search expression"));
        }
        let metrics = SearchMetrics::new();
        let expression = CompiledExpression::with_metrics(expression, &metrics)?;

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            Self::stop_run(&previous, true);
            self.emit(SearchEvent::Stopped { full_stop: true });
        }

        info!(
            "Starting search for '{}' in {} files",
            expression.as_str(),
            paths.len()
        );
        let run = Arc::new(SearchRun::new(
            expression,
            Arc::clone(&self.opener),
            self.pool.clone(),
            Arc::clone(&self.events),
            metrics,
        ));
        self.emit(SearchEvent::Started);

        run.paths.extend(paths);
        let shallow_jobs = self.pool.capacity() / 2;
        run.schedule(Priority::Shallow, shallow_jobs, shallow_scan);

        *current = Some(run);
        Ok(())
    }

    /// Stops the current search.
    ///
    /// Scanners notice at their next record or dequeue. With `full_stop` the
    /// pending work and all results are dropped as well; without it results
    /// found so far stay available through [`SearchEngine::results`].
    /// Always emits `Stopped`.
    pub fn cancel(&self, full_stop: bool) {
        let current = self.current.lock();
        if let Some(run) = current.as_ref() {
            Self::stop_run(run, full_stop);
        }
        self.emit(SearchEvent::Stopped { full_stop });
    }

    fn stop_run(run: &SearchRun, full_stop: bool) {
        if run.stop() {
            debug!("Search cancelled (full stop: {})", full_stop);
        }
        if full_stop {
            run.reset();
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|run| run.is_running())
    }

    /// Live view of the current search's results.
    ///
    /// The handle belongs to the search that is current at the time of the
    /// call; a later `search` starts a new store.
    pub fn results(&self) -> Arc<ResultStore> {
        match self.current.lock().as_ref() {
            Some(run) => Arc::clone(&run.results),
            None => Arc::clone(&self.no_results),
        }
    }

    /// Blocks until every scanner of the current search has returned, or
    /// `timeout` elapses. Returns whether the search went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let run = self.current.lock().clone();
        match run {
            Some(run) => run.active_workers().wait_idle(timeout),
            None => true,
        }
    }

    /// Counters of the current search.
    ///
    /// Each search counts into its own instance, so scanners of a replaced
    /// search never show up here. Before any search the counters are zero.
    pub fn metrics(&self) -> SearchMetrics {
        match self.current.lock().as_ref() {
            Some(run) => run.metrics.clone(),
            None => SearchMetrics::new(),
        }
    }

    fn emit(&self, event: SearchEvent) {
        self.events.emit(event);
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if let Some(run) = self.current.get_mut().as_ref() {
            run.stop();
            run.reset();
        }
    }
}
