use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FileOpener, IndexedFile, LogRecord};
use crate::errors::{SearchError, SearchResult};

/// Records held in memory, one payload string per record
#[derive(Debug, Clone)]
pub struct MemoryLogFile {
    path: PathBuf,
    records: Arc<Vec<String>>,
    indexed: bool,
}

impl MemoryLogFile {
    pub fn new(path: impl Into<PathBuf>, records: Vec<String>) -> Self {
        Self {
            path: path.into(),
            records: Arc::new(records),
            indexed: false,
        }
    }
}

impl IndexedFile for MemoryLogFile {
    fn build_index(&mut self) -> SearchResult<()> {
        self.indexed = true;
        Ok(())
    }

    fn record_count(&self) -> usize {
        if self.indexed {
            self.records.len()
        } else {
            0
        }
    }

    fn record(&self, position: usize) -> SearchResult<LogRecord> {
        let count = self.record_count();
        if position >= count {
            return Err(SearchError::record_out_of_range(position, count));
        }
        Ok(LogRecord::parse_line(position, &self.records[position]))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Serves [`MemoryLogFile`]s by path; unknown paths fail with `FileNotFound`
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    files: HashMap<PathBuf, Arc<Vec<String>>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, path: impl Into<PathBuf>, records: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = records.into_iter().map(Into::into).collect();
        self.files.insert(path.into(), Arc::new(records));
    }

    /// Builder form of [`MemoryOpener::insert`]
    pub fn with_file<I, S>(mut self, path: impl Into<PathBuf>, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(path, records);
        self
    }
}

impl FileOpener for MemoryOpener {
    fn open(&self, path: &Path) -> SearchResult<Box<dyn IndexedFile>> {
        let records = self
            .files
            .get(path)
            .ok_or_else(|| SearchError::file_not_found(path))?;
        Ok(Box::new(MemoryLogFile {
            path: path.to_path_buf(),
            records: Arc::clone(records),
            indexed: false,
        }))
    }
}
