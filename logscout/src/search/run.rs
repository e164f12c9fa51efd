use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::events::{EventSink, SearchEvent};
use super::matcher::CompiledExpression;
use super::pool::{Priority, WorkerPool};
use super::queue::SafeQueue;
use super::tracker::ActiveWorkers;
use crate::metrics::SearchMetrics;
use crate::results::{FileMatchRecord, ResultStore};
use crate::source::FileOpener;

/// State of one search.
///
/// Every search gets a fresh `SearchRun`, so scanners of a superseded search
/// keep working against their own (stopped) queues and store and can never
/// touch the state of the search that replaced it.
pub(crate) struct SearchRun {
    running: RwLock<bool>,
    pub(crate) expression: CompiledExpression,
    pub(crate) paths: SafeQueue<PathBuf>,
    pub(crate) promoted: SafeQueue<(usize, Arc<FileMatchRecord>)>,
    pub(crate) results: Arc<ResultStore>,
    pub(crate) opener: Arc<dyn FileOpener>,
    pub(crate) metrics: SearchMetrics,
    workers: ActiveWorkers,
    pool: WorkerPool,
    events: Arc<EventSink>,
}

impl SearchRun {
    pub(crate) fn new(
        expression: CompiledExpression,
        opener: Arc<dyn FileOpener>,
        pool: WorkerPool,
        events: Arc<EventSink>,
        metrics: SearchMetrics,
    ) -> Self {
        Self {
            running: RwLock::new(true),
            expression,
            paths: SafeQueue::new(),
            promoted: SafeQueue::new(),
            results: Arc::new(ResultStore::new()),
            opener,
            metrics,
            workers: ActiveWorkers::new(),
            pool,
            events,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Runs `f` only while the search is running, holding the run state
    /// read-locked so a concurrent cancel waits for `f` to complete.
    ///
    /// `f` must not call back into [`SearchRun::is_running`].
    pub(crate) fn while_running<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let running = self.running.read();
        if !*running {
            return None;
        }
        Some(f())
    }

    /// Clears the running flag; returns whether it was set
    pub(crate) fn stop(&self) -> bool {
        std::mem::replace(&mut *self.running.write(), false)
    }

    /// Drains both queues and the result store
    pub(crate) fn reset(&self) {
        self.paths.clear();
        self.promoted.clear();
        self.results.clear();
    }

    pub(crate) fn emit(&self, event: SearchEvent) {
        self.events.emit(event);
    }

    pub(crate) fn active_workers(&self) -> &ActiveWorkers {
        &self.workers
    }

    /// Schedules `jobs` copies of `task` as one registration
    pub(crate) fn schedule(
        self: &Arc<Self>,
        priority: Priority,
        jobs: usize,
        task: fn(&Arc<SearchRun>),
    ) {
        self.workers.register(jobs);
        for _ in 0..jobs {
            let run = Arc::clone(self);
            self.pool.submit(
                priority,
                Box::new(move || {
                    task(&run);
                    run.worker_finished();
                }),
            );
        }
    }

    fn worker_finished(&self) {
        self.workers.finish(|| {
            let mut running = self.running.write();
            if *running {
                *running = false;
                info!(
                    "Search finished. Found {} matches in {} files",
                    self.results.total_matches(),
                    self.results.len()
                );
                self.metrics.log_stats();
                self.emit(SearchEvent::SearchFinished);
            }
        });
    }
}
