//! Subset validation of candidate words against a pool of available letters.
//!
//! A word is *subset-formable* from a pool when every letter it uses is present
//! in the pool: `word & pool == word` on their letter masks. Dictionary
//! validation pushes this predicate into the store together with an exact
//! word match, so a listed word whose letters are missing from the pool never
//! validates.

use crate::alphabet::{Alphabet, LetterMask};
use crate::config;
use crate::error::ValidationError;
use crate::filter_types::FilterClause;
use crate::store::DictionaryStore;
use std::time::{Duration, Instant};

/// True iff every letter set in `word` is also set in `pool`.
#[inline]
pub fn is_subset_formable(word: LetterMask, pool: LetterMask) -> bool {
    word.is_subset_of(pool)
}

/// Outcome of a dictionary validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// The word exists verbatim and is formable from the pool.
    pub valid: bool,
    /// Time spent in the store lookup.
    pub elapsed: Duration,
}

/// Validates words against a [`DictionaryStore`].
#[derive(Debug, Clone)]
pub struct Validator<S> {
    store: S,
    alphabet: Alphabet,
}

impl<S: DictionaryStore> Validator<S> {
    pub fn new(store: S, alphabet: Alphabet) -> Self {
        Self { store, alphabet }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Checks that `word` is in the dictionary and formable from `available_letters`.
    ///
    /// Missing or empty letters fail with [`ValidationError::MissingLetters`]
    /// before the store is touched.
    pub fn validate_word(
        &self,
        word: &str,
        available_letters: Option<&str>,
    ) -> Result<Validation, ValidationError> {
        let pool = self.pool_mask(available_letters)?;
        let started = Instant::now();
        let filter = FilterClause::new().word_eq(word).letters_subset_of(pool);
        let found = self.store.find_entry(&filter)?;
        Ok(Validation {
            valid: found.is_some(),
            elapsed: started.elapsed(),
        })
    }

    /// Lists up to `limit` dictionary words formable from `available_letters`,
    /// in ingestion order. `limit` is clamped to
    /// [`MAX_FORMABLE_LIMIT`](config::MAX_FORMABLE_LIMIT).
    pub fn formable_words(
        &self,
        available_letters: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, ValidationError> {
        let pool = self.pool_mask(available_letters)?;
        let filter = FilterClause::new().letters_subset_of(pool);
        let limit = limit.min(config::MAX_FORMABLE_LIMIT);
        Ok(self
            .store
            .find_entries(&filter, limit)?
            .into_iter()
            .map(|e| e.word)
            .collect())
    }

    fn pool_mask(&self, available_letters: Option<&str>) -> Result<LetterMask, ValidationError> {
        match available_letters {
            Some(letters) if !letters.is_empty() => Ok(self.alphabet.encode(letters)),
            _ => Err(ValidationError::MissingLetters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DictionaryEntry, NewEntry};
    use crate::error::StoreError;
    use crate::storage::Dictionary;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn enc(text: &str) -> LetterMask {
        Alphabet::polish().encode(text)
    }

    fn validator(words: &[&str]) -> Validator<Dictionary> {
        let dict = Dictionary::new(Alphabet::polish().clone());
        dict.insert_batch(
            words
                .iter()
                .map(|w| NewEntry::encode(*w, Alphabet::polish()))
                .collect(),
        )
        .unwrap();
        Validator::new(dict, Alphabet::polish().clone())
    }

    /// Store that counts lookups and always fails them.
    #[derive(Default)]
    struct BrokenStore {
        lookups: AtomicUsize,
    }

    impl DictionaryStore for BrokenStore {
        fn insert_batch(&self, _rows: Vec<NewEntry>) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn find_entry(
            &self,
            _filter: &FilterClause,
        ) -> Result<Option<DictionaryEntry>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn find_entries(
            &self,
            _filter: &FilterClause,
            _limit: usize,
        ) -> Result<Vec<DictionaryEntry>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn entry_count(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn test_is_subset_formable() {
        assert!(is_subset_formable(enc("cat"), enc("tactical")));
        assert!(!is_subset_formable(enc("cats"), enc("tactical")));
        for w in ["cat", "tactical", "gżegżółka", ""] {
            assert!(is_subset_formable(enc(w), enc(w)));
        }
    }

    #[test]
    fn test_presence_only_rule() {
        // One 'a' in the pool is enough for every 'a' in the word.
        assert!(is_subset_formable(enc("aardvark"), enc("ardvk")));
        let v = validator(&["aardvark"]);
        assert!(v.validate_word("aardvark", Some("dravk")).unwrap().valid);
    }

    #[test]
    fn test_validate_word_examples() {
        let v = validator(&["cat", "dog"]);
        assert!(v.validate_word("cat", Some("tacocat")).unwrap().valid);
        assert!(!v.validate_word("dog", Some("tacocat")).unwrap().valid);
        assert!(!v.validate_word("cow", Some("cowboy")).unwrap().valid);
    }

    #[test]
    fn test_dog_never_valid_from_tacocat() {
        let empty = validator(&[]);
        assert!(!empty.validate_word("dog", Some("tacocat")).unwrap().valid);
        let with_dog = validator(&["dog"]);
        assert!(!with_dog.validate_word("dog", Some("tacocat")).unwrap().valid);
    }

    #[test]
    fn test_missing_letters_is_client_error() {
        let v = validator(&["cat"]);
        assert!(matches!(
            v.validate_word("cat", Some("")),
            Err(ValidationError::MissingLetters)
        ));
        assert!(matches!(
            v.validate_word("cat", None),
            Err(ValidationError::MissingLetters)
        ));
    }

    #[test]
    fn test_missing_letters_does_not_touch_store() {
        let v = Validator::new(BrokenStore::default(), Alphabet::polish().clone());
        assert!(matches!(
            v.validate_word("cat", None),
            Err(ValidationError::MissingLetters)
        ));
        assert_eq!(v.store().lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_store_failure_is_not_a_negative_result() {
        let v = Validator::new(BrokenStore::default(), Alphabet::polish().clone());
        let err = v.validate_word("cat", Some("tacocat")).unwrap_err();
        assert!(matches!(err, ValidationError::Store(StoreError::Unavailable(_))));
        assert_eq!(v.store().lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive_on_word() {
        let v = validator(&["Kraków"]);
        assert!(v.validate_word("Kraków", Some("krakow ó")).unwrap().valid);
        assert!(!v.validate_word("kraków", Some("krakow ó")).unwrap().valid);
    }

    #[test]
    fn test_empty_candidate_never_matches() {
        let v = validator(&["a"]);
        assert!(!v.validate_word("", Some("abc")).unwrap().valid);
    }

    #[test]
    fn test_foreign_characters_ignored_by_mask() {
        let v = validator(&["cat-1"]);
        assert!(v.validate_word("cat-1", Some("tac")).unwrap().valid);
        assert!(!v.validate_word("cat-2", Some("tac")).unwrap().valid);
    }

    #[test]
    fn test_formable_words() {
        let v = validator(&["act", "dog", "cat", "tact", "god"]);
        assert_eq!(
            v.formable_words(Some("tacocat"), 10).unwrap(),
            vec!["act", "cat", "tact"]
        );
        assert_eq!(v.formable_words(Some("odg"), 1).unwrap(), vec!["dog"]);
        assert!(matches!(
            v.formable_words(None, 10),
            Err(ValidationError::MissingLetters)
        ));
    }
}
