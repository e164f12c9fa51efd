use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::debug;

use super::queue::SafeQueue;
use crate::errors::{SearchError, SearchResult};

/// Smallest pool the engine runs with, so shallow and deep scans can overlap
pub const MIN_POOL_CAPACITY: usize = 2;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Which job queue a job goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// First-pass scans over the backlog of unscanned files
    Shallow,
    /// Exhaustive scans of promoted files; always taken first
    Deep,
}

struct PoolInner {
    threads: ThreadPool,
    deep: SafeQueue<Job>,
    shallow: SafeQueue<Job>,
    capacity: usize,
}

impl PoolInner {
    fn run_next(&self) {
        if let Some(job) = self.deep.pop().or_else(|| self.shallow.pop()) {
            job();
        }
    }
}

/// Fixed-size worker pool with two job queues.
///
/// Every submitted job also spawns one rayon task, and every rayon task runs
/// one job. A task does not run the job it was spawned for but the oldest job
/// of the highest-priority queue, so deep scans overtake shallow scans that
/// are still waiting for a thread.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.inner.capacity)
            .field("queued_deep", &self.inner.deep.len())
            .field("queued_shallow", &self.inner.shallow.len())
            .finish()
    }
}

impl WorkerPool {
    /// Creates a pool with `requested` threads, raised to [`MIN_POOL_CAPACITY`]
    pub fn new(requested: usize) -> SearchResult<Self> {
        let capacity = requested.max(MIN_POOL_CAPACITY);
        let threads = ThreadPoolBuilder::new()
            .num_threads(capacity)
            .thread_name(|i| format!("logscout-worker-{}", i))
            .build()
            .map_err(|e| SearchError::config_error(format!("cannot start worker pool: {}", e)))?;
        debug!("Worker pool started with {} threads", capacity);

        Ok(Self {
            inner: Arc::new(PoolInner {
                threads,
                deep: SafeQueue::new(),
                shallow: SafeQueue::new(),
                capacity,
            }),
        })
    }

    /// Effective number of threads
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub(crate) fn submit(&self, priority: Priority, job: Job) {
        match priority {
            Priority::Deep => self.inner.deep.push(job),
            Priority::Shallow => self.inner.shallow.push(job),
        }
        let inner = Arc::clone(&self.inner);
        self.inner.threads.spawn(move || inner.run_next());
    }
}
