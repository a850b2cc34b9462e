//! Dictionary entry types.
//!
//! A [`DictionaryEntry`] is an immutable stored row: a unique word and the
//! letter mask of that word. [`NewEntry`] is the insert-side shape, before the
//! store assigns an identity.

use crate::alphabet::{Alphabet, LetterMask};
use serde::{Deserialize, Serialize};

/// A stored dictionary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Store-assigned identity, increasing in insertion order, starting at 1.
    pub id: u64,
    /// The word exactly as ingested. Unique.
    pub word: String,
    /// `Alphabet::encode(word)` at ingestion time.
    pub letters: LetterMask,
}

/// A row waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub word: String,
    pub letters: LetterMask,
}

impl NewEntry {
    /// Encodes `word` with `alphabet`, keeping `letters` consistent with `word`.
    pub fn encode(word: impl Into<String>, alphabet: &Alphabet) -> Self {
        let word = word.into();
        let letters = alphabet.encode(&word);
        Self { word, letters }
    }
}
