//! Filter evaluation for dictionary lookups.
//!
//! Evaluates [`FilterClause`] predicates against stored entries. All `must`
//! conditions are AND-ed.

use crate::entry::DictionaryEntry;
use crate::filter_types::{FilterClause, FilterCondition};

/// Check if an entry matches every condition of the clause.
pub fn matches_filter(entry: &DictionaryEntry, filter: &FilterClause) -> bool {
    filter
        .must
        .iter()
        .all(|cond| evaluate_condition(entry, cond))
}

fn evaluate_condition(entry: &DictionaryEntry, cond: &FilterCondition) -> bool {
    match cond {
        FilterCondition::WordEq { value } => entry.word == *value,
        FilterCondition::LettersSubsetOf { pool } => entry.letters.is_subset_of(*pool),
    }
}
