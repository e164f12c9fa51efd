use memmap2::Mmap;
use std::fs::File;
use std::ops::{Deref, Range};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{trace, warn};

use super::{FileOpener, IndexedFile, LogRecord};
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};

// Files at or above this size are memory mapped instead of read into memory
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

enum Contents {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Contents {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Contents::Owned(bytes) => bytes,
            Contents::Mapped(mmap) => mmap,
        }
    }
}

/// A line-oriented log file; every non-blank line is one record
pub struct TextLogFile {
    path: PathBuf,
    contents: Contents,
    lines: Vec<Range<usize>>,
    encoding_mode: EncodingMode,
    warned_lossy: AtomicBool,
}

impl std::fmt::Debug for TextLogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLogFile")
            .field("path", &self.path)
            .field("bytes", &self.contents.len())
            .field("records", &self.lines.len())
            .finish()
    }
}

impl TextLogFile {
    /// Opens `path`, reading small files and memory mapping large ones
    pub fn open(path: &Path, encoding_mode: EncodingMode) -> SearchResult<Self> {
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| SearchError::from_io(path, e))?
            .len();

        let contents = if size >= LARGE_FILE_THRESHOLD {
            trace!("Memory mapping {} ({} bytes)", path.display(), size);
            let mmap = unsafe { Mmap::map(&file) }.map_err(SearchError::IoError)?;
            Contents::Mapped(mmap)
        } else {
            Contents::Owned(std::fs::read(path).map_err(|e| SearchError::from_io(path, e))?)
        };

        Ok(Self {
            path: path.to_path_buf(),
            contents,
            lines: Vec::new(),
            encoding_mode,
            warned_lossy: AtomicBool::new(false),
        })
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> SearchResult<std::borrow::Cow<'a, str>> {
        match self.encoding_mode {
            EncodingMode::FailFast => std::str::from_utf8(bytes)
                .map(std::borrow::Cow::Borrowed)
                .map_err(|e| SearchError::encoding_error(&self.path, e)),
            EncodingMode::Lossy => {
                let cow = String::from_utf8_lossy(bytes);
                if matches!(cow, std::borrow::Cow::Owned(_))
                    && !self.warned_lossy.swap(true, Ordering::Relaxed)
                {
                    warn!("Invalid UTF-8 replaced in file: {}", self.path.display());
                }
                Ok(cow)
            }
        }
    }
}

impl IndexedFile for TextLogFile {
    fn build_index(&mut self) -> SearchResult<()> {
        let bytes: &[u8] = &self.contents;
        let mut lines = Vec::new();
        let mut start = 0;

        for line in bytes.split(|&b| b == b'\n') {
            let end = start + line.len();
            let trimmed_end = if line.last() == Some(&b'\r') { end - 1 } else { end };
            if !bytes[start..trimmed_end].iter().all(u8::is_ascii_whitespace) {
                lines.push(start..trimmed_end);
            }
            start = end + 1;
        }

        trace!("Indexed {} records in {}", lines.len(), self.path.display());
        self.lines = lines;
        Ok(())
    }

    fn record_count(&self) -> usize {
        self.lines.len()
    }

    fn record(&self, position: usize) -> SearchResult<LogRecord> {
        let range = self
            .lines
            .get(position)
            .cloned()
            .ok_or_else(|| SearchError::record_out_of_range(position, self.lines.len()))?;
        let text = self.decode(&self.contents[range])?;
        Ok(LogRecord::parse_line(position, &text))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Opens [`TextLogFile`]s with a fixed encoding mode
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLogOpener {
    encoding_mode: EncodingMode,
}

impl TextLogOpener {
    pub fn new(encoding_mode: EncodingMode) -> Self {
        Self { encoding_mode }
    }
}

impl FileOpener for TextLogOpener {
    fn open(&self, path: &Path) -> SearchResult<Box<dyn IndexedFile>> {
        Ok(Box::new(TextLogFile::open(path, self.encoding_mode)?))
    }
}
