use rayon::prelude::*;

use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;

/// Rank every query on the rayon pool; results keep the input order.
pub fn process_queries<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries.par_iter().map(|q| engine.find_top_documents(q.as_ref())).collect()
}

pub fn process_queries_joined<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(engine, queries)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;
    use crate::error::SearchError;

    fn engine() -> SearchEngine {
        let engine = SearchEngine::new("and with").unwrap();
        let texts = ["funny pet and nasty rat", "funny pet with curly hair", "big dog and cat"];
        for (i, text) in texts.iter().enumerate() {
            engine.add_document(i as i32 + 1, text, DocumentStatus::Actual, &[1]).unwrap();
        }
        engine
    }

    #[test]
    fn results_follow_query_order() {
        let engine = engine();
        let queries = ["nasty rat", "curly hair", "unknown", "dog"];
        let results = process_queries(&engine, &queries).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0][0].id, 1);
        assert_eq!(results[1][0].id, 2);
        assert!(results[2].is_empty());
        assert_eq!(results[3][0].id, 3);

        let joined = process_queries_joined(&engine, &queries).unwrap();
        assert_eq!(joined.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn bad_query_fails_the_batch() {
        let engine = engine();
        let err = process_queries(&engine, &["rat".to_string(), "rat-".to_string()]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }
}
