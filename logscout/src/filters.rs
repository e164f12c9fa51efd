/// Path predicates used while collecting log files.
///
/// These are free functions rather than a trait: discovery only ever needs
/// the one extension + ignore-pattern policy below.
use glob::Pattern;
use std::path::Path;

/// Checks if a file has one of the wanted extensions (case-insensitive).
/// `None` accepts every file.
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => {
            if let Some(ext) = path.extension() {
                if let Some(ext_str) = ext.to_str() {
                    return exts
                        .iter()
                        .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext_str));
                }
            }
            false
        }
    }
}

/// Checks if a file should be ignored based on glob ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    if ignore_patterns.is_empty() {
        return false;
    }
    let normalized_path = path.to_string_lossy().replace('\\', "/");

    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&normalized_path),
        Err(_) => false,
    })
}

/// Determines if a file should be searched
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    has_valid_extension(path, extensions) && !should_ignore(path, ignore_patterns)
}
