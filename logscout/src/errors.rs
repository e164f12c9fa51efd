/// This module defines the error type shared by every part of logscout.
///
/// # Error Categories
///
/// Errors fall into a few groups that are handled very differently:
///
/// 1. **Configuration errors** (`ConfigError`, `InvalidPattern`)
///    - Returned synchronously from `SearchEngine::search` before any work is queued
///    - No progress events are emitted for a rejected search
///
/// 2. **Per-file errors** (`FileNotFound`, `PermissionDenied`, `IoError`)
///    - Produced by a `FileOpener` or while indexing a file
///    - Never abort a search: the scanner logs the failure and moves on
///
/// 3. **Per-record errors** (`EncodingError`, `RecordOutOfRange`)
///    - Produced when a single record cannot be loaded
///    - The scanner skips the record and keeps scanning the file
///
/// ```rust,ignore
/// match engine.search(paths, "timeout|refused") {
///     Ok(()) => // consume events,
///     Err(SearchError::InvalidPattern(msg)) => // tell the user,
///     Err(e) => // other configuration problem
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("Record {position} out of range (file has {count} records)")]
    RecordOutOfRange { position: usize, count: usize },
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    pub fn record_out_of_range(position: usize, count: usize) -> Self {
        Self::RecordOutOfRange { position, count }
    }

    /// Maps an `io::Error` raised while touching `path` to the closest variant
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
