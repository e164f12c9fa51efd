use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Tracks throughput and cache counters for one search.
///
/// Cloning is cheap and every clone shares the same counters, so the engine,
/// the scanners of a search and the expression cache can all record into one
/// instance.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    // File counters
    files_scanned: Arc<AtomicU64>,
    files_skipped: Arc<AtomicU64>,
    files_matched: Arc<AtomicU64>,

    // Record counters
    records_scanned: Arc<AtomicU64>,
    records_skipped: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,

    // Expression cache metrics
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
}

impl SearchMetrics {
    /// Creates a new SearchMetrics instance
    pub fn new() -> Self {
        Self {
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_skipped: Arc::new(AtomicU64::new(0)),
            files_matched: Arc::new(AtomicU64::new(0)),
            records_scanned: Arc::new(AtomicU64::new(0)),
            records_skipped: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a file that was opened and indexed
    pub fn record_file_scanned(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file that could not be opened or indexed
    pub fn record_file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file promoted after its first match
    pub fn record_file_matched(&self) {
        self.files_matched.fetch_add(1, Ordering::Relaxed);
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a batch of records tested against the expression
    pub fn record_records_scanned(&self, count: u64) {
        self.records_scanned.fetch_add(count, Ordering::Relaxed);
    }

    /// Records a record that failed to load
    pub fn record_record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an additional match found by a deep scan
    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an expression cache lookup
    pub fn record_cache_operation(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Resets every counter to zero
    pub fn reset(&self) {
        for counter in [
            &self.files_scanned,
            &self.files_skipped,
            &self.files_matched,
            &self.records_scanned,
            &self.records_skipped,
            &self.matches_found,
            &self.cache_hits,
            &self.cache_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Gets a snapshot of the current counters
    pub fn get_stats(&self) -> SearchStats {
        SearchStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Files scanned/skipped/matched: {}/{}/{}\n\
             Records scanned/skipped: {}/{}\n\
             Matches found: {}\n\
             Expression cache hits/misses: {}/{}",
            stats.files_scanned,
            stats.files_skipped,
            stats.files_matched,
            stats.records_scanned,
            stats.records_skipped,
            stats.matches_found,
            stats.cache_hits,
            stats.cache_misses
        );
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub files_matched: u64,
    pub records_scanned: u64,
    pub records_skipped: u64,
    pub matches_found: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}
