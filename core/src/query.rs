use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};

/// A parsed query: required (scored) terms and excluding terms.
///
/// Both lists are sorted and free of duplicates and stop words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub plus_words: Vec<String>,
    pub minus_words: Vec<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.plus_words.is_empty() && self.minus_words.is_empty()
    }
}

struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'a>(token: &'a str, stop_words: &StopWords) -> Result<QueryWord<'a>> {
    if token == "-" || token.starts_with("--") || token.ends_with('-') {
        return Err(SearchError::invalid_query(format!("malformed query word {token:?}")));
    }
    let (data, is_minus) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if !is_valid_word(data) {
        return Err(SearchError::malformed(format!(
            "query word {data:?} contains control characters"
        )));
    }
    Ok(QueryWord { data, is_minus, is_stop: stop_words.contains(data) })
}

pub fn parse_query(text: &str, stop_words: &StopWords) -> Result<Query> {
    let mut query = Query::default();
    for token in split_into_words(text) {
        let word = parse_query_word(token, stop_words)?;
        if word.is_stop {
            continue;
        }
        if word.is_minus {
            query.minus_words.push(word.data.to_string());
        } else {
            query.plus_words.push(word.data.to_string());
        }
    }
    query.plus_words.sort_unstable();
    query.plus_words.dedup();
    query.minus_words.sort_unstable();
    query.minus_words.dedup();
    Ok(query)
}
