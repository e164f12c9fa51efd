/// This module implements the two-phase concurrent log search.
///
/// # Search Phases
///
/// 1. **Shallow scan**: half of the worker pool pulls paths from the work
///    queue and scans each file only until its first matching record. That
///    file is then *promoted*: its match record is appended to the result
///    store, a `FoundFile` event goes out, and a deep scan is scheduled.
/// 2. **Deep scan**: one job per promoted file scans the rest of the file and
///    appends every further match, emitting `ResultPartial` for each.
///
/// Deep scans are always taken from the pool before waiting shallow scans, so
/// promoted files are completed before the backlog of unscanned files grows.
///
/// # Completion and Cancellation
///
/// Every scanner job is counted from the moment it is scheduled until it
/// returns. The job that brings the count back to zero ends the search with a
/// `SearchFinished` event, unless the search was cancelled first.
///
/// Cancellation is cooperative: scanners check the run state before every
/// dequeue and every record. Progress events are emitted under the run
/// state's read lock, so once `cancel` returns no further progress of that
/// search is reported.
///
/// ```rust,ignore
/// let engine = SearchEngine::new(&config)?;
/// let events = engine.events();
/// engine.search(paths, &combine_patterns(&config.patterns)?)?;
/// ```
pub mod engine;
pub mod events;
pub mod matcher;
pub mod pool;
pub mod queue;
mod run;
mod scanner;
pub mod tracker;

pub use engine::SearchEngine;
pub use events::SearchEvent;
pub use matcher::{combine_patterns, CompiledExpression};
pub use pool::{WorkerPool, MIN_POOL_CAPACITY};
