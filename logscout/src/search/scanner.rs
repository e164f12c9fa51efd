//! The two scanner roles.
//!
//! A shallow scanner walks the backlog of unscanned files and stops at the
//! first matching record of each one, promoting the file. A deep scanner
//! takes one promoted file and finds every remaining match in it. Both check
//! the run state before every dequeue and every record, so a cancel takes
//! effect between two records.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use super::events::SearchEvent;
use super::pool::Priority;
use super::run::SearchRun;
use crate::errors::SearchResult;
use crate::results::FileMatchRecord;
use crate::source::IndexedFile;

/// Finds the first match of each file pulled from the work queue
pub(crate) fn shallow_scan(run: &Arc<SearchRun>) {
    debug!("Shallow scanner started, {} files queued", run.paths.len());

    while run.is_running() {
        let Some(path) = run.paths.pop() else {
            break;
        };

        let file = match open_indexed(run, &path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                run.metrics.record_file_skipped();
                continue;
            }
        };
        run.metrics.record_file_scanned();
        trace!("Shallow scan of {} ({} records)", path.display(), file.record_count());

        let mut scanned = 0;
        let mut first_match = None;
        for position in 0..file.record_count() {
            if !run.is_running() {
                break;
            }
            scanned += 1;
            if record_matches(run, file.as_ref(), position) {
                first_match = Some(position);
                break;
            }
        }
        run.metrics.record_records_scanned(scanned);

        if let Some(position) = first_match {
            promote(run, file, position);
        }
    }

    debug!(
        "Shallow scanner done, {} files matched so far",
        run.results.len()
    );
}

/// Finds every match after the first one in one promoted file
pub(crate) fn deep_scan(run: &Arc<SearchRun>) {
    let Some((index, record)) = run.promoted.pop() else {
        // A full cancel drained the queue after this job was scheduled
        trace!("Deep scanner found no promoted file");
        return;
    };

    let file = Arc::clone(record.file());
    let start = record.first_match() + 1;
    let mut scanned = 0;

    for position in start..file.record_count() {
        if !run.is_running() {
            break;
        }
        scanned += 1;
        if !record_matches(run, file.as_ref(), position) {
            continue;
        }

        let reported = run.while_running(|| {
            let match_index = record.push_match(position);
            run.emit(SearchEvent::ResultPartial {
                index,
                position: match_index,
            });
        });
        if reported.is_none() {
            break;
        }
        run.metrics.record_match();
    }
    run.metrics.record_records_scanned(scanned);

    debug!(
        "Deep scan of {} done, {} matches",
        file.path().display(),
        record.match_count()
    );
}

fn open_indexed(run: &SearchRun, path: &Path) -> SearchResult<Arc<dyn IndexedFile>> {
    let mut file = run.opener.open(path)?;
    file.build_index()?;
    Ok(Arc::from(file))
}

fn record_matches(run: &SearchRun, file: &dyn IndexedFile, position: usize) -> bool {
    match file.record(position) {
        Ok(record) => run.expression.is_match(&record.payload),
        Err(e) => {
            trace!(
                "Skipping record {} of {}: {}",
                position,
                file.path().display(),
                e
            );
            run.metrics.record_record_skipped();
            false
        }
    }
}

/// Stores the file's record, queues it for a deep scan and announces it
fn promote(run: &Arc<SearchRun>, file: Arc<dyn IndexedFile>, position: usize) {
    let record = Arc::new(FileMatchRecord::new(file, position));

    let promoted = run.while_running(|| {
        let index = run.results.push(Arc::clone(&record));
        run.promoted.push((index, Arc::clone(&record)));
        run.emit(SearchEvent::FoundFile { index });
        index
    });

    // Scheduling takes the worker tracker's lock, which must not be
    // acquired while the run state is held
    if let Some(index) = promoted {
        run.metrics.record_file_matched();
        trace!(
            "Promoted {} as #{} (first match at {})",
            record.path().display(),
            index,
            position
        );
        run.schedule(Priority::Deep, 1, deep_scan);
    }
}
