//! Declarative lookup filters for the dictionary store.
//!
//! A [`FilterClause`] is a conjunction of [`FilterCondition`]s. Stores evaluate
//! it natively and may use their indexes to do so: `word_eq` is answered by the
//! word index and `letters_subset_of` by a scan over the letters index.

use crate::alphabet::LetterMask;
use serde::{Deserialize, Serialize};

/// Conjunction of conditions; an empty clause matches every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    #[serde(default)]
    pub must: Vec<FilterCondition>,
}

/// A single predicate on a dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterCondition {
    /// `word = value`, case-sensitive.
    WordEq { value: String },
    /// `letters & pool = letters`.
    LettersSubsetOf { pool: LetterMask },
}

impl FilterClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word_eq(mut self, word: impl Into<String>) -> Self {
        self.must.push(FilterCondition::WordEq { value: word.into() });
        self
    }

    pub fn letters_subset_of(mut self, pool: LetterMask) -> Self {
        self.must.push(FilterCondition::LettersSubsetOf { pool });
        self
    }

    /// First `word_eq` value, used to drive an index lookup.
    pub fn word_key(&self) -> Option<&str> {
        self.must.iter().find_map(|c| match c {
            FilterCondition::WordEq { value } => Some(value.as_str()),
            _ => None,
        })
    }

    /// Intersection of all `letters_subset_of` pools, if any are present.
    pub fn subset_pool(&self) -> Option<LetterMask> {
        self.must
            .iter()
            .filter_map(|c| match c {
                FilterCondition::LettersSubsetOf { pool } => Some(*pool),
                _ => None,
            })
            .reduce(|a, b| LetterMask::from_bits(a.bits() & b.bits()))
    }
}
