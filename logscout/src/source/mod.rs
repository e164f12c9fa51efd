//! Indexed log files.
//!
//! The search engine never parses a log format itself. It opens files through
//! a [`FileOpener`], asks the returned [`IndexedFile`] to build its record
//! index, and then reads records by position. Two implementations ship with
//! the crate:
//!
//! - [`TextLogFile`]: line-oriented log files on disk
//! - [`MemoryLogFile`]: records held in memory, handy for tests and embedders

pub mod memory;
pub mod text;

pub use memory::{MemoryLogFile, MemoryOpener};
pub use text::{TextLogFile, TextLogOpener};

use std::fmt::Debug;
use std::path::Path;
use std::time::SystemTime;

use crate::errors::SearchResult;

/// A single log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Position of the record inside its file
    pub position: usize,
    /// Text the search expression is matched against
    pub payload: String,
    pub timestamp: Option<SystemTime>,
    /// Originating application / component id
    pub app_id: Option<String>,
    pub context_id: Option<String>,
}

impl LogRecord {
    /// Builds a record from one line of text.
    ///
    /// A line that starts with an RFC 3339 timestamp is read as
    /// `timestamp app_id context_id payload...`; anything else is payload only.
    pub fn parse_line(position: usize, line: &str) -> Self {
        let line = line.trim_end();
        let (first, rest) = split_token(line);

        let timestamp = match humantime::parse_rfc3339_weak(first) {
            Ok(ts) => ts,
            _ => return Self::payload_only(position, line.trim_start()),
        };

        let (app_id, rest) = split_token(rest);
        let (context_id, payload) = split_token(rest);

        Self {
            position,
            payload: payload.to_string(),
            timestamp: Some(timestamp),
            app_id: non_empty(app_id),
            context_id: non_empty(context_id),
        }
    }

    pub fn payload_only(position: usize, payload: impl Into<String>) -> Self {
        Self {
            position,
            payload: payload.into(),
            timestamp: None,
            app_id: None,
            context_id: None,
        }
    }
}

fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Random access to the records of one opened log file
pub trait IndexedFile: Debug + Send + Sync {
    /// Builds the record index. Until this succeeds the file reports zero records.
    fn build_index(&mut self) -> SearchResult<()>;

    fn record_count(&self) -> usize;

    /// Loads the record at `position`, failing with `RecordOutOfRange` past the end
    fn record(&self, position: usize) -> SearchResult<LogRecord>;

    fn path(&self) -> &Path;
}

/// Opens files for the engine
pub trait FileOpener: Send + Sync {
    fn open(&self, path: &Path) -> SearchResult<Box<dyn IndexedFile>>;
}
