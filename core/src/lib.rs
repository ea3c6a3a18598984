//! In-process TF-IDF search core: an inverted index over short documents,
//! keyword queries with exclusion terms, and sequential or parallel ranking.

pub mod concurrent_map;
pub mod config;
pub mod document;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod index;
pub mod paginate;
pub mod process_queries;
pub mod query;
pub mod request_queue;
pub mod tokenizer;

pub use concurrent_map::{BucketKey, ConcurrentMap};
pub use config::EngineConfig;
pub use document::{compute_average_rating, DocId, Document, DocumentStatus};
pub use duplicates::remove_duplicates;
pub use engine::{ExecutionPolicy, SearchEngine};
pub use error::{Result, SearchError};
pub use index::{DocumentData, InvertedIndex, TermFreqs};
pub use paginate::{paginate, Paginator};
pub use process_queries::{process_queries, process_queries_joined};
pub use query::{parse_query, Query};
pub use request_queue::RequestQueue;
pub use tokenizer::{is_valid_word, split_into_words, StopWords};
