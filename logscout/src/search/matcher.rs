use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;

const SIMPLE_PATTERN_THRESHOLD: usize = 32;

static EXPRESSION_CACHE: Lazy<DashMap<String, MatchStrategy>> = Lazy::new(DashMap::new);

/// Strategy for matching one expression
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// ASCII literal, stored lowercased and compared with ASCII case folding.
    /// Text that is not pure ASCII goes through `unicode` instead, so that
    /// e.g. the Kelvin sign still folds to `k` the way the regex path does.
    Simple { needle: String, unicode: Arc<Regex> },
    Regex(Arc<Regex>),
}

/// A case-insensitive expression compiled once per search
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    strategy: MatchStrategy,
}

impl CompiledExpression {
    /// Compiles `expression`, reusing a cached compilation when available
    pub fn new(expression: &str) -> SearchResult<Self> {
        Self::compile(expression, None)
    }

    /// Compiles `expression` and records the cache lookup in `metrics`
    pub fn with_metrics(expression: &str, metrics: &SearchMetrics) -> SearchResult<Self> {
        Self::compile(expression, Some(metrics))
    }

    fn compile(expression: &str, metrics: Option<&SearchMetrics>) -> SearchResult<Self> {
        let cached = EXPRESSION_CACHE
            .get(expression)
            .map(|entry| entry.value().clone());

        let strategy = match cached {
            Some(strategy) => {
                if let Some(metrics) = metrics {
                    metrics.record_cache_operation(true);
                }
                strategy
            }
            None => {
                let strategy = if Self::is_simple_pattern(expression) {
                    MatchStrategy::Simple {
                        needle: expression.to_ascii_lowercase(),
                        unicode: Arc::new(Self::build_regex(&regex::escape(expression))?),
                    }
                } else {
                    MatchStrategy::Regex(Arc::new(Self::build_regex(expression)?))
                };
                if let Some(metrics) = metrics {
                    metrics.record_cache_operation(false);
                }
                EXPRESSION_CACHE.insert(expression.to_string(), strategy.clone());
                strategy
            }
        };

        Ok(Self {
            source: expression.to_string(),
            strategy,
        })
    }

    fn build_regex(pattern: &str) -> SearchResult<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::invalid_pattern(e.to_string()))
    }

    /// Determines if a pattern can use literal matching
    fn is_simple_pattern(pattern: &str) -> bool {
        !pattern.is_empty()
            && pattern.len() < SIMPLE_PATTERN_THRESHOLD
            && pattern
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-')
    }

    /// The expression this matcher was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    /// Tests whether `text` contains a match
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Byte range of the leftmost match in `text`
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        match &self.strategy {
            MatchStrategy::Simple { unicode, .. } if !text.is_ascii() => {
                unicode.find(text).map(|m| (m.start(), m.end()))
            }
            MatchStrategy::Simple { needle, .. } => {
                let needle = needle.as_bytes();
                text.as_bytes()
                    .windows(needle.len())
                    .position(|window| window.eq_ignore_ascii_case(needle))
                    .map(|start| (start, start + needle.len()))
            }
            MatchStrategy::Regex(regex) => regex.find(text).map(|m| (m.start(), m.end())),
        }
    }
}

/// Combines user patterns into one expression of the form `(p1)|(p2)`.
///
/// Blank patterns are dropped; every remaining pattern must compile on its own
/// so that the error names the offending pattern rather than the combination.
pub fn combine_patterns<S: AsRef<str>>(patterns: &[S]) -> SearchResult<String> {
    let mut parts = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() {
            continue;
        }
        Regex::new(pattern)
            .map_err(|e| SearchError::invalid_pattern(format!("'{}': {}", pattern, e)))?;
        parts.push(format!("({})", pattern));
    }

    if parts.is_empty() {
        return Err(SearchError::config_error("no search pattern given"));
    }
    Ok(parts.join("|"))
}
