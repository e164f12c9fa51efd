/// Match records and the result store a search writes into.
///
/// # Sharing Model
///
/// A [`FileMatchRecord`] is created once, when a shallow scan finds the first
/// match in a file. From then on it is shared between:
///
/// 1. the promotion queue entry handed to exactly one deep scanner,
/// 2. the [`ResultStore`] entry at its discovery index,
/// 3. any consumer reading results while the search is still running.
///
/// Only the deep scanner ever appends to `matches`, so writers never contend
/// with each other; the reader/writer lock only arbitrates between that one
/// writer and concurrent readers.
///
/// The store itself only grows during a search. Index assignment happens under
/// the same write lock as the append, which makes the index in a `FoundFile`
/// event stable and unique for the lifetime of the search.
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::source::{IndexedFile, LogRecord};

/// All matches found so far in one file
#[derive(Debug)]
pub struct FileMatchRecord {
    file: Arc<dyn IndexedFile>,
    matches: RwLock<Vec<usize>>,
}

impl FileMatchRecord {
    /// Creates a record whose first match is at `first_match`
    pub fn new(file: Arc<dyn IndexedFile>, first_match: usize) -> Self {
        Self {
            file,
            matches: RwLock::new(vec![first_match]),
        }
    }

    pub fn file(&self) -> &Arc<dyn IndexedFile> {
        &self.file
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Position of the record that promoted this file; never changes
    pub fn first_match(&self) -> usize {
        self.matches.read()[0]
    }

    pub fn match_count(&self) -> usize {
        self.matches.read().len()
    }

    /// Record position of the `index`-th match in this file
    pub fn match_at(&self, index: usize) -> Option<usize> {
        self.matches.read().get(index).copied()
    }

    /// Copy of the match positions found so far
    pub fn matches(&self) -> Vec<usize> {
        self.matches.read().clone()
    }

    /// Appends a match position and returns its index within this record
    pub(crate) fn push_match(&self, position: usize) -> usize {
        let mut matches = self.matches.write();
        debug_assert!(
            matches.last().is_some_and(|&last| last < position),
            "match positions must be strictly increasing"
        );
        matches.push(position);
        matches.len() - 1
    }

    /// The records from `before` ahead of `position` to `after` past it,
    /// clamped to the file. Records that fail to load are left out.
    pub fn context(&self, position: usize, before: usize, after: usize) -> Vec<LogRecord> {
        let count = self.file.record_count();
        if count == 0 {
            return Vec::new();
        }
        let start = position.saturating_sub(before);
        let end = position.saturating_add(after).min(count - 1);
        (start..=end)
            .filter_map(|p| self.file.record(p).ok())
            .collect()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            path: self.path().to_path_buf(),
            matches: self.matches(),
        }
    }
}

/// Ordered, append-only collection of match records for one search
#[derive(Debug, Default)]
pub struct ResultStore {
    records: RwLock<Vec<Arc<FileMatchRecord>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` and returns its discovery index
    pub fn push(&self, record: Arc<FileMatchRecord>) -> usize {
        let mut records = self.records.write();
        records.push(record);
        records.len() - 1
    }

    /// Record at discovery index `index`
    pub fn at(&self, index: usize) -> Option<Arc<FileMatchRecord>> {
        self.records.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Handles to every record, in discovery order
    pub fn records(&self) -> Vec<Arc<FileMatchRecord>> {
        self.records.read().clone()
    }

    /// Total number of matches across all records
    pub fn total_matches(&self) -> usize {
        self.records.read().iter().map(|r| r.match_count()).sum()
    }

    pub fn summary(&self) -> SearchSummary {
        let mut summary = SearchSummary::new();
        for record in self.records() {
            summary.add_file(record.summary());
        }
        summary
    }
}

/// Owned snapshot of one file's matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    /// Record positions, ascending
    pub matches: Vec<usize>,
}

/// Owned snapshot of a result store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    /// Results per file, in discovery order
    pub files: Vec<FileSummary>,
    pub total_matches: usize,
    pub files_with_matches: usize,
}

impl SearchSummary {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_file(&mut self, file: FileSummary) {
        if !file.matches.is_empty() {
            self.total_matches += file.matches.len();
            self.files_with_matches += 1;
        }
        self.files.push(file);
    }
}
