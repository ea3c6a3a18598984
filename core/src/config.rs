use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const RELEVANCE_EPSILON: f64 = 1e-6;
pub const DEFAULT_SCORE_BUCKETS: usize = 64;
/// One query a minute for a day.
pub const DEFAULT_REQUEST_WINDOW: usize = 1440;

/// Tunables of a [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the number of hits a ranking call returns.
    pub max_result_document_count: usize,
    /// Relevances closer than this are considered equal and ordered by rating.
    pub relevance_epsilon: f64,
    /// Number of lock shards used by the parallel ranking path.
    pub score_buckets: usize,
    /// Size of the sliding window kept by a [`RequestQueue`](crate::RequestQueue).
    pub request_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_result_document_count: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
            score_buckets: DEFAULT_SCORE_BUCKETS,
            request_window: DEFAULT_REQUEST_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.score_buckets == 0 {
            return Err(SearchError::invalid_config("score_buckets must be at least 1"));
        }
        if self.request_window == 0 {
            return Err(SearchError::invalid_config("request_window must be at least 1"));
        }
        if !self.relevance_epsilon.is_finite() || self.relevance_epsilon < 0.0 {
            return Err(SearchError::invalid_config(
                "relevance_epsilon must be a finite non-negative number",
            ));
        }
        Ok(())
    }
}
