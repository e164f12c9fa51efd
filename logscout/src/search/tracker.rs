use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Counts the scanner jobs of one search that are scheduled or running.
///
/// A job is registered when it is scheduled, not when it starts, and a
/// shallow scanner registers its deep scanner before deregistering itself.
/// The count therefore only reaches zero once no work of the search is left,
/// independent of how large the worker pool is.
#[derive(Debug, Default)]
pub struct ActiveWorkers {
    count: Mutex<usize>,
    idle: Condvar,
}

impl ActiveWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `jobs` scheduled jobs in one step
    pub fn register(&self, jobs: usize) {
        *self.count.lock() += jobs;
    }

    /// Deregisters one job. When it was the last one, `on_idle` runs while
    /// the count is still locked, so no job can slip in between the count
    /// reaching zero and the idle handling.
    pub fn finish<F: FnOnce()>(&self, on_idle: F) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "worker finished without being registered");
        *count = count.saturating_sub(1);
        if *count == 0 {
            on_idle();
            self.idle.notify_all();
        }
    }

    pub fn active(&self) -> usize {
        *self.count.lock()
    }

    /// Waits until no job is registered. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}
