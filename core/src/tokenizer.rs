use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::error::{Result, SearchError};

lazy_static! {
    static ref SPACES: Regex = Regex::new(r" +").expect("valid regex");
}

/// Split text on runs of space characters, discarding empty fragments.
///
/// Only `' '` separates words; any other whitespace stays inside the word and
/// is later rejected by [`is_valid_word`].
pub fn split_into_words(text: &str) -> Vec<&str> {
    SPACES.split(text).filter(|w| !w.is_empty()).collect()
}

/// A word is valid when it carries no C0 control characters (U+0001..=U+001F).
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| {
        let code = c as u32;
        code > 0 && code < 32
    })
}

/// Immutable set of words excluded from indexing and from queries.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Build from a blank-delimited string such as `"and in the"`.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_words(split_into_words(text))
    }

    /// Build from an explicit collection. Empty entries are ignored.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::invalid_config(format!(
                    "stop word {word:?} contains control characters"
                )));
            }
            set.insert(word.to_string());
        }
        Ok(Self { words: set })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Split document text and drop stop words, rejecting control characters.
pub fn split_into_words_no_stop<'a>(text: &'a str, stop_words: &StopWords) -> Result<Vec<&'a str>> {
    let mut words = Vec::new();
    for word in split_into_words(text) {
        if !is_valid_word(word) {
            return Err(SearchError::malformed(format!(
                "word {word:?} contains control characters"
            )));
        }
        if !stop_words.contains(word) {
            words.push(word);
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_runs_of_spaces() {
        assert_eq!(split_into_words("  cat   in the  city "), vec!["cat", "in", "the", "city"]);
        assert!(split_into_words("    ").is_empty());
    }

    #[test]
    fn control_characters_are_invalid() {
        assert!(is_valid_word("cat"));
        assert!(!is_valid_word("ca\u{12}t"));
        assert!(!is_valid_word("tab\there"));
    }

    #[test]
    fn stop_words_drop_empty_and_reject_control() {
        let sw = StopWords::from_words(["in", "", "the"]).unwrap();
        assert_eq!(sw.len(), 2);
        assert!(matches!(
            StopWords::parse("in t\u{1}he"),
            Err(SearchError::InvalidConfig(_))
        ));
    }
}
