//! Error types for the search core.
//!
//! Every fallible operation of the engine returns [`SearchError`]. Nothing is
//! retried internally: an in-memory index has no transient failure modes, so a
//! failure always means the caller handed in something the engine rejects.

use thiserror::Error;

use crate::document::DocId;

/// All errors surfaced by the index, the query parser and the ranking engine.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Negative document id.
    #[error("invalid document id {0}: ids must be non-negative")]
    InvalidId(DocId),

    /// The id is already present in the index.
    #[error("document id {0} is already indexed")]
    DuplicateId(DocId),

    /// The operation references an id that is not in the index.
    #[error("unknown document id {0}")]
    UnknownId(DocId),

    /// Control characters in document or query text, or a document with no
    /// indexable terms.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Malformed exclusion token in a query: bare `-`, `--term` or `term-`.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Bad stop words or out-of-range engine settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text that is not valid JSON.
    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`SearchError`].
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        SearchError::MalformedInput(msg.into())
    }

    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        SearchError::InvalidQuery(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SearchError::InvalidConfig(msg.into())
    }
}
