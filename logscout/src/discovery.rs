use ignore::WalkBuilder;
use std::path::PathBuf;
use tracing::debug;

use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::should_include_file;

/// Collects the log files under `config.root_path`.
///
/// Files closer to the root come first, so a search reports the top-level
/// logs before it digs into nested directories. Within one depth the order is
/// by file name.
pub fn collect_log_files(config: &SearchConfig) -> SearchResult<Vec<PathBuf>> {
    let root = &config.root_path;
    if !root.exists() {
        return Err(SearchError::file_not_found(root));
    }
    if !root.is_dir() {
        return Err(SearchError::config_error(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .ignore(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| {
            should_include_file(
                entry.path(),
                &config.file_extensions,
                &config.ignore_patterns,
            )
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort_by_key(|path| path.components().count());

    debug!("Found {} log files under {}", files.len(), root.display());
    Ok(files)
}
