pub mod config;
pub mod discovery;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;
pub mod source;

pub use config::{EncodingMode, SearchConfig};
pub use discovery::collect_log_files;
pub use errors::{SearchError, SearchResult};
pub use results::{FileMatchRecord, ResultStore, SearchSummary};
pub use search::{combine_patterns, CompiledExpression, SearchEngine, SearchEvent};
