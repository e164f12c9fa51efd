use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Configuration for a log search.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later sources
/// overriding earlier ones:
/// 1. Global `$CONFIG_DIR/logscout/config.yaml`
/// 2. Local `.logscout.yaml` in the current directory
/// 3. Custom config file specified via `--config` flag
///
/// # Configuration Format
///
/// ```yaml
/// # Patterns, combined as (p1)|(p2) and matched case-insensitively
/// patterns:
///   - "connection refused"
///   - "timeout after \\d+ms"
///
/// # Directory that is walked for log files
/// root_path: "/var/log/traces"
///
/// # Extensions of files to search (default: dlt, log, txt)
/// file_extensions: ["dlt", "log"]
///
/// # Patterns to ignore (glob syntax)
/// ignore_patterns:
///   - "**/archive/**"
///
/// # Records shown around each match
/// context_before: 2
/// context_after: 2
///
/// # Worker pool size (default: CPU cores, never below 2)
/// thread_count: 8
///
/// # How invalid UTF-8 in records is handled (lossy|failfast)
/// encoding_mode: lossy
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence over file values, see
/// [`SearchConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search patterns (regex syntax, case-insensitive)
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Root directory that is walked for log files
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// File extensions to include. `None` includes every file.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Option<Vec<String>>,

    /// Patterns to ignore (supports glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to only show statistics instead of individual matches
    #[serde(default)]
    pub stats_only: bool,

    /// Number of records shown before each match
    #[serde(default)]
    pub context_before: usize,

    /// Number of records shown after each match
    #[serde(default)]
    pub context_after: usize,

    /// Number of worker threads in the search pool
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How invalid UTF-8 sequences inside records are handled
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

/// How invalid UTF-8 inside a record is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Replace invalid sequences with U+FFFD and keep the record
    #[default]
    Lossy,
    /// Fail the record; the scanner skips it
    FailFast,
}

pub const DEFAULT_EXTENSIONS: &[&str] = &["dlt", "log", "txt"];

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_extensions() -> Option<Vec<String>> {
    Some(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
}

pub(crate) fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            root_path: default_root_path(),
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            stats_only: false,
            context_before: 0,
            context_after: 0,
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            encoding_mode: EncodingMode::default(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("logscout/config.yaml")),
            Some(PathBuf::from(".logscout.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        if !cli_config.patterns.is_empty() {
            self.patterns = cli_config.patterns;
        }
        if cli_config.root_path != default_root_path() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.file_extensions != default_file_extensions() {
            self.file_extensions = cli_config.file_extensions;
        }
        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        if cli_config.stats_only {
            self.stats_only = true;
        }
        if cli_config.context_before > 0 {
            self.context_before = cli_config.context_before;
        }
        if cli_config.context_after > 0 {
            self.context_after = cli_config.context_after;
        }
        self.thread_count = cli_config.thread_count;
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.encoding_mode != EncodingMode::default() {
            self.encoding_mode = cli_config.encoding_mode;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            patterns: ["connection refused", "timeout"]
            root_path: "traces"
            file_extensions: ["dlt"]
            ignore_patterns: ["**/archive/**"]
            stats_only: true
            context_before: 3
            context_after: 1
            thread_count: 4
            log_level: "debug"
            encoding_mode: failfast
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.patterns, vec!["connection refused", "timeout"]);
        assert_eq!(config.root_path, PathBuf::from("traces"));
        assert_eq!(config.file_extensions, Some(vec!["dlt".to_string()]));
        assert_eq!(config.ignore_patterns, vec!["**/archive/**".to_string()]);
        assert!(config.stats_only);
        assert_eq!(config.context_before, 3);
        assert_eq!(config.context_after, 1);
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.encoding_mode, EncodingMode::FailFast);
    }

    #[test]
    fn test_merge_with_cli() {
        let config_file = SearchConfig {
            patterns: vec!["error".to_string()],
            root_path: PathBuf::from("traces"),
            file_extensions: Some(vec!["dlt".to_string()]),
            ignore_patterns: vec!["**/old/**".to_string()],
            context_before: 5,
            context_after: 5,
            thread_count: NonZeroUsize::new(4).unwrap(),
            ..SearchConfig::default()
        };

        let cli_config = SearchConfig {
            patterns: vec!["fatal".to_string()],
            root_path: PathBuf::from("logs"),
            stats_only: true,
            context_after: 2,
            thread_count: NonZeroUsize::new(8).unwrap(),
            log_level: "debug".to_string(),
            ..SearchConfig::default()
        };

        let merged = config_file.merge_with_cli(cli_config);
        assert_eq!(merged.patterns, vec!["fatal"]); // CLI value
        assert_eq!(merged.root_path, PathBuf::from("logs")); // CLI value
        assert_eq!(merged.file_extensions, Some(vec!["dlt".to_string()])); // File value
        assert_eq!(merged.ignore_patterns, vec!["**/old/**".to_string()]); // File value
        assert!(merged.stats_only);
        assert_eq!(merged.context_before, 5); // File value
        assert_eq!(merged.context_after, 2); // CLI value
        assert_eq!(merged.thread_count, NonZeroUsize::new(8).unwrap());
        assert_eq!(merged.log_level, "debug");
        assert_eq!(merged.encoding_mode, EncodingMode::Lossy);
    }

    #[test]
    fn test_default_values() {
        let config_content = r#"
            patterns: ["test"]
        "#;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.patterns, vec!["test"]);
        assert_eq!(config.root_path, PathBuf::from("."));
        assert_eq!(
            config.file_extensions,
            Some(vec!["dlt".to_string(), "log".to_string(), "txt".to_string()])
        );
        assert!(config.ignore_patterns.is_empty());
        assert!(!config.stats_only);
        assert_eq!(config.context_before, 0);
        assert_eq!(config.context_after, 0);
        assert_eq!(
            config.thread_count,
            NonZeroUsize::new(num_cpus::get()).unwrap()
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.encoding_mode, EncodingMode::Lossy);
    }

    #[test]
    fn test_invalid_config() {
        let config_content = r#"
            patterns: 123
            root_path: []
            thread_count: "invalid"
        "#;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let result = SearchConfig::load_from(Some(&config_path));
        assert!(result.is_err(), "Expected error loading invalid config");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SearchConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }
}
