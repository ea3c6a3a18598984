use std::collections::VecDeque;

use crate::document::{DocId, Document, DocumentStatus};
use crate::engine::SearchEngine;
use crate::error::Result;

/// Tracks how many of the last `window` ranking requests returned nothing.
pub struct RequestQueue<'a> {
    engine: &'a SearchEngine,
    window: usize,
    requests: VecDeque<bool>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    /// Window size comes from the engine's configuration.
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self::with_window(engine, engine.config().request_window)
    }

    pub fn with_window(engine: &'a SearchEngine, window: usize) -> Self {
        let window = window.max(1);
        Self { engine, window, requests: VecDeque::with_capacity(window), no_result_requests: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, move |_, s, _| s == status)
    }

    /// Queries that fail to parse are returned as errors and not recorded.
    pub fn add_find_request_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let result = self.engine.find_top_documents_by(raw_query, predicate)?;
        self.record(result.is_empty());
        Ok(result)
    }

    fn record(&mut self, empty: bool) {
        if self.requests.len() == self.window {
            if let Some(true) = self.requests.pop_front() {
                self.no_result_requests -= 1;
            }
        }
        self.requests.push_back(empty);
        if empty {
            self.no_result_requests += 1;
        }
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }
}
