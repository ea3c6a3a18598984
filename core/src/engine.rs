//! The search engine: document mutation, TF-IDF ranking and matching.
//!
//! The index sits behind a single [`RwLock`]. Mutations prepare everything
//! (validation, tokenization, term frequencies) before taking the write lock,
//! so a document is published or withdrawn in one step and a failed call
//! leaves the index untouched. Ranking and matching hold a recursive read
//! lock for their whole traversal and never block each other, even when a
//! writer is queued.

use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::concurrent_map::ConcurrentMap;
use crate::config::EngineConfig;
use crate::document::{DocId, Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::index::{InvertedIndex, PendingDocument, TermFreqs};
use crate::query::{parse_query, Query};
use crate::tokenizer::StopWords;

/// Selects how ranking, matching and removal distribute their work.
///
/// Parallel reads may be issued from rayon workers; parallel removal may not
/// (see [`SearchEngine::par_remove_document`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Terms are processed on the rayon pool.
    Parallel,
}

pub struct SearchEngine {
    stop_words: StopWords,
    config: EngineConfig,
    index: RwLock<InvertedIndex>,
}

impl SearchEngine {
    /// Build an engine from blank-delimited stop words, e.g. `"and in the"`.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Self::with_config(StopWords::parse(stop_words_text)?, EngineConfig::default())
    }

    pub fn from_stop_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(StopWords::from_words(words)?, EngineConfig::default())
    }

    pub fn with_config(stop_words: StopWords, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { stop_words, config, index: RwLock::new(InvertedIndex::new()) })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn add_document(
        &self,
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        let doc = PendingDocument::build(id, text, status, ratings, &self.stop_words)?;
        let terms = doc.term_freqs.len();
        self.index.write().insert(doc)?;
        tracing::debug!(id, terms, ?status, "document added");
        Ok(())
    }

    pub fn remove_document(&self, id: DocId) -> Result<()> {
        self.remove_document_with(ExecutionPolicy::Sequential, id)
    }

    /// Removal with the per-term erasure on the rayon pool.
    ///
    /// The write lock is held while rayon runs, so this must not be called
    /// from inside a rayon task whose sibling tasks use the same engine: a
    /// worker waiting on the erasure may pick up such a task and block on the
    /// lock it already holds. Use [`remove_document`](Self::remove_document)
    /// there.
    pub fn par_remove_document(&self, id: DocId) -> Result<()> {
        self.remove_document_with(ExecutionPolicy::Parallel, id)
    }

    pub fn remove_document_with(&self, policy: ExecutionPolicy, id: DocId) -> Result<()> {
        let mut index = self.index.write();
        match policy {
            ExecutionPolicy::Sequential => index.remove(id)?,
            ExecutionPolicy::Parallel => index.par_remove(id)?,
        };
        drop(index);
        tracing::debug!(id, ?policy, "document removed");
        Ok(())
    }

    pub fn document_count(&self) -> usize {
        self.index.read_recursive().len()
    }

    /// Ascending snapshot of the live ids.
    pub fn document_ids(&self) -> Vec<DocId> {
        self.index.read_recursive().ids().collect()
    }

    /// Term frequencies of `id`; empty for an unknown id.
    pub fn word_frequencies(&self, id: DocId) -> TermFreqs {
        self.index.read_recursive().word_frequencies(id).cloned().unwrap_or_default()
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, s, _| s == status)
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        self.rank(raw_query, |index, query| find_all_documents(index, query, &predicate))
    }

    pub fn par_find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.par_find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn par_find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.par_find_top_documents_by(raw_query, move |_, s, _| s == status)
    }

    pub fn par_find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let buckets = self.config.score_buckets;
        self.rank(raw_query, |index, query| par_find_all_documents(index, query, &predicate, buckets))
    }

    /// Rank documents matching `raw_query` and accepted by `predicate`.
    ///
    /// Hits are ordered by descending relevance; relevances within
    /// `relevance_epsilon` of each other fall back to descending rating, then
    /// ascending id. At most `max_result_document_count` hits are returned.
    /// Both policies return the same hits in the same order.
    pub fn find_top_documents_with<P>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        match policy {
            ExecutionPolicy::Sequential => self.find_top_documents_by(raw_query, predicate),
            ExecutionPolicy::Parallel => self.par_find_top_documents_by(raw_query, predicate),
        }
    }

    /// Parse, score under the read lock, then sort and truncate.
    ///
    /// Reads use `read_recursive`: a rayon worker may re-enter the engine while
    /// another read on the same thread is still waiting on the pool.
    fn rank<F>(&self, raw_query: &str, score: F) -> Result<Vec<Document>>
    where
        F: FnOnce(&InvertedIndex, &Query) -> BTreeMap<DocId, f64>,
    {
        let query = parse_query(raw_query, &self.stop_words)?;
        let mut matched = {
            let guard = self.index.read_recursive();
            let index: &InvertedIndex = &guard;
            score(index, &query)
                .into_iter()
                .filter_map(|(id, relevance)| {
                    index.document(id).map(|data| Document::new(id, relevance, data.rating))
                })
                .collect::<Vec<_>>()
        };

        sort_by_relevance(&mut matched, self.config.relevance_epsilon);
        matched.truncate(self.config.max_result_document_count);
        Ok(matched)
    }

    pub fn match_document(&self, raw_query: &str, id: DocId) -> Result<(Vec<String>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, id)
    }

    pub fn par_match_document(&self, raw_query: &str, id: DocId) -> Result<(Vec<String>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Parallel, raw_query, id)
    }

    /// Plus-words of `raw_query` present in document `id`, sorted, together
    /// with the document's status. Any matching minus-word empties the list.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        id: DocId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        let guard = self.index.read_recursive();
        let index: &InvertedIndex = &guard;
        let status = index.document(id).ok_or(SearchError::UnknownId(id))?.status;
        let query = parse_query(raw_query, &self.stop_words)?;

        let contains = |word: &String| {
            index.postings(word).is_some_and(|postings| postings.contains_key(&id))
        };

        let matched = match policy {
            ExecutionPolicy::Sequential => {
                if query.minus_words.iter().any(contains) {
                    return Ok((Vec::new(), status));
                }
                query.plus_words.iter().filter(|w| contains(*w)).cloned().collect()
            }
            ExecutionPolicy::Parallel => {
                if query.minus_words.par_iter().any(contains) {
                    return Ok((Vec::new(), status));
                }
                let mut words: Vec<String> =
                    query.plus_words.par_iter().filter(|w| contains(*w)).cloned().collect();
                words.par_sort_unstable();
                words.dedup();
                words
            }
        };
        Ok((matched, status))
    }
}

fn find_all_documents<P>(index: &InvertedIndex, query: &Query, predicate: &P) -> BTreeMap<DocId, f64>
where
    P: Fn(DocId, DocumentStatus, i32) -> bool,
{
    let mut document_to_relevance: BTreeMap<DocId, f64> = BTreeMap::new();
    for word in &query.plus_words {
        let (Some(postings), Some(idf)) = (index.postings(word), index.inverse_document_freq(word)) else {
            continue;
        };
        for (&id, &tf) in postings {
            let Some(data) = index.document(id) else { continue };
            if predicate(id, data.status, data.rating) {
                *document_to_relevance.entry(id).or_insert(0.0) += tf * idf;
            }
        }
    }

    for word in &query.minus_words {
        if let Some(postings) = index.postings(word) {
            for id in postings.keys() {
                document_to_relevance.remove(id);
            }
        }
    }
    document_to_relevance
}

fn par_find_all_documents<P>(
    index: &InvertedIndex,
    query: &Query,
    predicate: &P,
    buckets: usize,
) -> BTreeMap<DocId, f64>
where
    P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
{
    let document_to_relevance: ConcurrentMap<DocId, f64> = ConcurrentMap::new(buckets);

    query.plus_words.par_iter().for_each(|word| {
        let (Some(postings), Some(idf)) = (index.postings(word), index.inverse_document_freq(word)) else {
            return;
        };
        for (&id, &tf) in postings {
            let Some(data) = index.document(id) else { continue };
            if predicate(id, data.status, data.rating) {
                *document_to_relevance.access(id) += tf * idf;
            }
        }
    });

    query.minus_words.par_iter().for_each(|word| {
        if let Some(postings) = index.postings(word) {
            for id in postings.keys() {
                document_to_relevance.erase(id);
            }
        }
    });

    document_to_relevance.materialize()
}

/// Order hits by relevance, treating relevances within `epsilon` as equal.
///
/// Equal-relevance groups are formed against the first (highest) relevance of
/// the group, which keeps the comparison a total order; inside a group hits go
/// by descending rating, then ascending id.
fn sort_by_relevance(docs: &mut [Document], epsilon: f64) {
    docs.sort_by(|a, b| b.relevance.total_cmp(&a.relevance).then(a.id.cmp(&b.id)));

    let mut groups = Vec::with_capacity(docs.len());
    let mut group = 0usize;
    let mut anchor = docs.first().map(|d| d.relevance).unwrap_or_default();
    for doc in docs.iter() {
        if anchor - doc.relevance >= epsilon {
            group += 1;
            anchor = doc.relevance;
        }
        groups.push((group, *doc));
    }

    groups.sort_by(|(ga, a), (gb, b)| {
        ga.cmp(gb)
            .then(b.rating.cmp(&a.rating))
            .then(b.relevance.total_cmp(&a.relevance))
            .then(a.id.cmp(&b.id))
    });
    for (slot, (_, doc)) in docs.iter_mut().zip(groups) {
        *slot = doc;
    }
}
