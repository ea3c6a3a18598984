use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::document::{compute_average_rating, DocId, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::tokenizer::{split_into_words_no_stop, StopWords};

/// Term frequencies of one document, ordered by term.
pub type TermFreqs = BTreeMap<String, f64>;
/// Postings of one term, ordered by document id.
pub type Postings = BTreeMap<DocId, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub rating: i32,
    pub status: DocumentStatus,
    pub text: String,
}

/// A document that passed validation and has its term frequencies computed,
/// ready to be published into an [`InvertedIndex`].
///
/// Only [`PendingDocument::build`] creates one, and only the engine publishes
/// it:
///
/// ```compile_fail
/// use search_core::index::{InvertedIndex, PendingDocument};
/// use search_core::{DocumentStatus, StopWords};
///
/// let doc = PendingDocument::build(1, "cat", DocumentStatus::Actual, &[], &StopWords::default()).unwrap();
/// let mut index = InvertedIndex::new();
/// index.insert(doc).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PendingDocument {
    pub(crate) id: DocId,
    pub(crate) data: DocumentData,
    pub(crate) term_freqs: TermFreqs,
}

impl PendingDocument {
    pub fn build(
        id: DocId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
        stop_words: &StopWords,
    ) -> Result<Self> {
        if id < 0 {
            return Err(SearchError::InvalidId(id));
        }
        let words = split_into_words_no_stop(text, stop_words)?;
        if words.is_empty() {
            return Err(SearchError::malformed(format!(
                "document {id} has no indexable words"
            )));
        }

        let inv_word_count = 1.0 / words.len() as f64;
        let mut term_freqs = TermFreqs::new();
        for word in words {
            *term_freqs.entry(word.to_string()).or_insert(0.0) += inv_word_count;
        }

        Ok(Self {
            id,
            data: DocumentData { rating: compute_average_rating(ratings), status, text: text.to_string() },
            term_freqs,
        })
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn data(&self) -> &DocumentData {
        &self.data
    }

    pub fn term_freqs(&self) -> &TermFreqs {
        &self.term_freqs
    }
}

/// Document store plus the posting relation in both directions.
///
/// `term_to_docs` and `doc_to_terms` are only written through `insert`,
/// [`remove`] and [`par_remove`], each of which updates both sides, so the two
/// views always describe the same set of postings. A term whose posting set
/// becomes empty is dropped, so every indexed term has df >= 1.
///
/// [`remove`]: InvertedIndex::remove
/// [`par_remove`]: InvertedIndex::par_remove
#[derive(Debug, Default)]
pub struct InvertedIndex {
    term_to_docs: HashMap<String, Postings>,
    doc_to_terms: BTreeMap<DocId, TermFreqs>,
    docs: BTreeMap<DocId, DocumentData>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, doc: PendingDocument) -> Result<()> {
        if self.docs.contains_key(&doc.id) {
            return Err(SearchError::DuplicateId(doc.id));
        }
        for (term, &tf) in &doc.term_freqs {
            self.term_to_docs.entry(term.clone()).or_default().insert(doc.id, tf);
        }
        self.doc_to_terms.insert(doc.id, doc.term_freqs);
        self.docs.insert(doc.id, doc.data);
        Ok(())
    }

    pub fn remove(&mut self, id: DocId) -> Result<DocumentData> {
        let data = self.docs.remove(&id).ok_or(SearchError::UnknownId(id))?;
        let term_freqs = self.doc_to_terms.remove(&id).unwrap_or_default();
        for term in term_freqs.keys() {
            if let Some(postings) = self.term_to_docs.get_mut(term) {
                postings.remove(&id);
                if postings.is_empty() {
                    self.term_to_docs.remove(term);
                }
            }
        }
        Ok(data)
    }

    /// Same effect as [`remove`](Self::remove), with the per-term erasure
    /// spread over the rayon pool. Only the document's own posting sets are
    /// touched.
    pub fn par_remove(&mut self, id: DocId) -> Result<DocumentData> {
        let data = self.docs.remove(&id).ok_or(SearchError::UnknownId(id))?;
        let term_freqs = self.doc_to_terms.remove(&id).unwrap_or_default();
        let mut detached: Vec<(String, Postings)> = term_freqs
            .keys()
            .filter_map(|term| self.term_to_docs.remove_entry(term))
            .collect();
        detached.par_iter_mut().for_each(|(_, postings)| {
            postings.remove(&id);
        });
        self.term_to_docs
            .extend(detached.into_iter().filter(|(_, postings)| !postings.is_empty()));
        Ok(data)
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn document(&self, id: DocId) -> Option<&DocumentData> {
        self.docs.get(&id)
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.term_to_docs.get(term)
    }

    pub fn word_frequencies(&self, id: DocId) -> Option<&TermFreqs> {
        self.doc_to_terms.get(&id)
    }

    /// `ln(N / df)`; `None` for a term that is not indexed.
    pub fn inverse_document_freq(&self, term: &str) -> Option<f64> {
        let df = self.term_to_docs.get(term)?.len();
        Some((self.docs.len() as f64 / df as f64).ln())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.term_to_docs.len()
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: DocId, text: &str) -> PendingDocument {
        let sw = StopWords::parse("in the").unwrap();
        PendingDocument::build(id, text, DocumentStatus::Actual, &[1, 2, 3], &sw).unwrap()
    }

    /// Every (term, doc, tf) seen from one side must be present on the other.
    fn assert_consistent(idx: &InvertedIndex) {
        for (term, postings) in &idx.term_to_docs {
            assert!(!postings.is_empty());
            for (id, tf) in postings {
                assert_eq!(idx.doc_to_terms[id][term], *tf);
            }
        }
        for (id, freqs) in &idx.doc_to_terms {
            assert!(idx.docs.contains_key(id));
            for (term, tf) in freqs {
                assert_eq!(idx.term_to_docs[term][id], *tf);
            }
        }
        assert_eq!(idx.docs.len(), idx.doc_to_terms.len());
    }

    #[test]
    fn build_computes_tf_and_rating() {
        let doc = pending(1, "cat in the city cat");
        assert_eq!(doc.data.rating, 2);
        assert_eq!(doc.term_freqs["cat"], 2.0 / 3.0);
        assert_eq!(doc.term_freqs["city"], 1.0 / 3.0);
        assert!(!doc.term_freqs.contains_key("in"));
    }

    #[test]
    fn build_rejects_negative_and_empty() {
        let sw = StopWords::parse("in the").unwrap();
        assert!(matches!(
            PendingDocument::build(-1, "cat", DocumentStatus::Actual, &[], &sw),
            Err(SearchError::InvalidId(-1))
        ));
        assert!(matches!(
            PendingDocument::build(1, "in the", DocumentStatus::Actual, &[], &sw),
            Err(SearchError::MalformedInput(_))
        ));
    }

    #[test]
    fn insert_and_remove_keep_both_directions_in_sync() {
        let mut idx = InvertedIndex::new();
        idx.insert(pending(1, "cat in the city")).unwrap();
        idx.insert(pending(2, "dog in the city")).unwrap();
        assert_consistent(&idx);
        assert_eq!(idx.postings("city").unwrap().len(), 2);

        idx.remove(1).unwrap();
        assert_consistent(&idx);
        assert!(idx.postings("cat").is_none());
        assert_eq!(idx.postings("city").unwrap().len(), 1);

        idx.par_remove(2).unwrap();
        assert_consistent(&idx);
        assert_eq!(idx.term_count(), 0);
        assert!(idx.is_empty());
    }

    #[test]
    fn par_remove_drops_only_the_documents_own_terms() {
        let mut idx = InvertedIndex::new();
        for id in 0..50 {
            idx.insert(pending(id, &format!("shared only{id} also{id}"))).unwrap();
        }
        idx.insert(pending(100, "shared city unique")).unwrap();
        let before = idx.term_count();

        idx.par_remove(100).unwrap();
        assert_consistent(&idx);
        // "city" and "unique" vanish, "shared" keeps the other 50 postings.
        assert_eq!(idx.term_count(), before - 2);
        assert_eq!(idx.postings("shared").unwrap().len(), 50);
        assert_eq!(idx.postings("only7").unwrap().len(), 1);

        idx.par_remove(7).unwrap();
        assert_consistent(&idx);
        assert_eq!(idx.term_count(), before - 4);
        assert!(matches!(idx.par_remove(7), Err(SearchError::UnknownId(7))));
    }

    #[test]
    fn duplicate_insert_leaves_index_unchanged() {
        let mut idx = InvertedIndex::new();
        idx.insert(pending(1, "cat")).unwrap();
        assert!(matches!(idx.insert(pending(1, "dog")), Err(SearchError::DuplicateId(1))));
        assert!(idx.postings("dog").is_none());
        assert_consistent(&idx);
    }

    #[test]
    fn idf_uses_natural_log() {
        let mut idx = InvertedIndex::new();
        idx.insert(pending(1, "cat city")).unwrap();
        idx.insert(pending(2, "dog city")).unwrap();
        assert!((idx.inverse_document_freq("cat").unwrap() - 2f64.ln()).abs() < 1e-12);
        assert_eq!(idx.inverse_document_freq("city").unwrap(), 0.0);
        assert!(idx.inverse_document_freq("bird").is_none());
    }
}
