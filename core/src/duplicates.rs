use std::collections::{BTreeSet, HashMap};

use crate::document::DocId;
use crate::engine::SearchEngine;
use crate::error::Result;

/// Remove documents whose set of distinct indexed words repeats that of a
/// document with a lower id. Returns the removed ids in ascending order.
pub fn remove_duplicates(engine: &SearchEngine) -> Result<Vec<DocId>> {
    let mut first_by_words: HashMap<BTreeSet<String>, DocId> = HashMap::new();
    let mut duplicates = Vec::new();

    for id in engine.document_ids() {
        let words: BTreeSet<String> = engine.word_frequencies(id).into_keys().collect();
        // A document removed by another thread after the snapshot has no words.
        if words.is_empty() {
            continue;
        }
        match first_by_words.get(&words) {
            Some(_) => duplicates.push(id),
            None => {
                first_by_words.insert(words, id);
            }
        }
    }

    for &id in &duplicates {
        tracing::info!(id, "found duplicate document id");
        engine.remove_document(id)?;
    }
    Ok(duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    #[test]
    fn keeps_lowest_id_of_each_word_set() {
        let engine = SearchEngine::new("and with").unwrap();
        let docs = [
            (1, "funny pet and nasty rat"),
            (2, "funny pet with curly hair"),
            (3, "funny pet with curly hair"),
            (4, "funny pet and curly hair"),
            (5, "funny funny pet and nasty nasty rat"),
            (6, "funny pet and not very nasty rat"),
            (7, "very nasty rat and not very funny pet"),
            (8, "pet with rat and rat and rat"),
            (9, "nasty rat with curly hair"),
        ];
        for (id, text) in docs {
            engine.add_document(id, text, DocumentStatus::Actual, &[1, 2]).unwrap();
        }

        let removed = remove_duplicates(&engine).unwrap();
        assert_eq!(removed, vec![3, 4, 5, 7]);
        assert_eq!(engine.document_ids(), vec![1, 2, 6, 8, 9]);
    }

    #[test]
    fn nothing_to_remove() {
        let engine = SearchEngine::new("").unwrap();
        engine.add_document(1, "a b", DocumentStatus::Actual, &[]).unwrap();
        engine.add_document(2, "a c", DocumentStatus::Actual, &[]).unwrap();
        assert!(remove_duplicates(&engine).unwrap().is_empty());
        assert_eq!(engine.document_count(), 2);
    }
}
