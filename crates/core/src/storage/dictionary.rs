//! Dictionary data structures.
//!
//! A [`Dictionary`] holds every entry in memory together with two indexes:
//! a unique index on `word` and a grouping index on `letters` that answers
//! subset-of scans by visiting each distinct mask once. Batches are validated,
//! written to the WAL, and applied under a single write lock, so readers see
//! either none or all of a batch.

use crate::alphabet::{Alphabet, LetterMask};
use crate::config;
use crate::entry::{DictionaryEntry, NewEntry};
use crate::error::StoreError;
use crate::filter_types::FilterClause;
use crate::search::filter::matches_filter;
use crate::storage::persistence::save_snapshot;
use crate::storage::wal::{SyncWriteAheadLog, WalEntry};
use crate::store::DictionaryStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::io;
use std::sync::Arc;

/// Internal data for a dictionary, protected by a `RwLock`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DictionaryData {
    /// Alphabet the stored masks were encoded with.
    pub alphabet: String,
    /// All entries keyed by id.
    pub entries: BTreeMap<u64, DictionaryEntry>,
    /// Unique index: word → id.
    pub word_index: HashMap<String, u64>,
    /// Letters index: mask → ids sharing it, ascending.
    pub letters_index: BTreeMap<LetterMask, Vec<u64>>,
    /// Next identity value to assign.
    pub next_id: u64,
}

impl DictionaryData {
    /// Creates an empty dictionary for `alphabet`.
    pub fn new(alphabet: &Alphabet) -> Self {
        Self {
            alphabet: alphabet.to_string(),
            entries: BTreeMap::new(),
            word_index: HashMap::new(),
            letters_index: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate internal invariants after deserialization.
    ///
    /// Checks that both indexes cover exactly the stored entries and that the
    /// identity counter is ahead of every assigned id.
    pub fn validate(&self) -> Result<(), String> {
        if self.word_index.len() != self.entries.len() {
            return Err(format!(
                "word_index({}) != entries({})",
                self.word_index.len(),
                self.entries.len()
            ));
        }
        let indexed: usize = self.letters_index.values().map(Vec::len).sum();
        if indexed != self.entries.len() {
            return Err(format!(
                "letters_index({}) != entries({})",
                indexed,
                self.entries.len()
            ));
        }
        for (id, entry) in &self.entries {
            if entry.id != *id {
                return Err(format!("entry id {} stored under key {}", entry.id, id));
            }
            if self.word_index.get(&entry.word) != Some(id) {
                return Err(format!("word '{}' not indexed to id {}", entry.word, id));
            }
            let in_letters = self
                .letters_index
                .get(&entry.letters)
                .is_some_and(|ids| ids.binary_search(id).is_ok());
            if !in_letters {
                return Err(format!("id {} missing from letters_index", id));
            }
        }
        if let Some((&max_id, _)) = self.entries.last_key_value() {
            if self.next_id <= max_id {
                return Err(format!("next_id {} <= max id {}", self.next_id, max_id));
            }
        }
        Ok(())
    }

    /// Checks a batch against the unique and length constraints without mutating.
    fn check_batch(&self, rows: &[NewEntry]) -> Result<(), StoreError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
        for row in rows {
            if row.word.len() > config::MAX_WORD_LEN {
                return Err(StoreError::WordTooLong {
                    word: row.word.clone(),
                    len: row.word.len(),
                });
            }
            if self.word_index.contains_key(&row.word) || !seen.insert(row.word.as_str()) {
                return Err(StoreError::DuplicateWord {
                    word: row.word.clone(),
                });
            }
        }
        Ok(())
    }

    /// Applies a batch that already passed [`check_batch`](Self::check_batch).
    fn apply_batch(&mut self, rows: Vec<NewEntry>) -> usize {
        let count = rows.len();
        for row in rows {
            let id = self.next_id;
            self.next_id += 1;
            self.word_index.insert(row.word.clone(), id);
            // Ids only grow, so pushing keeps each list sorted.
            self.letters_index.entry(row.letters).or_default().push(id);
            self.entries.insert(
                id,
                DictionaryEntry {
                    id,
                    word: row.word,
                    letters: row.letters,
                },
            );
        }
        count
    }

    /// Ids matching `filter`, ascending, at most `limit`.
    ///
    /// Uses the word index when the clause pins a word, the letters index when it
    /// carries a subset pool, and a full scan otherwise.
    fn select_ids(&self, filter: &FilterClause, limit: usize) -> Vec<u64> {
        if limit == 0 {
            return Vec::new();
        }
        if let Some(word) = filter.word_key() {
            return self
                .word_index
                .get(word)
                .filter(|id| self.matches(**id, filter))
                .map(|id| vec![*id])
                .unwrap_or_default();
        }
        if let Some(pool) = filter.subset_pool() {
            let lists: Vec<&[u64]> = self
                .letters_index
                .iter()
                .filter(|(mask, _)| mask.is_subset_of(pool))
                .map(|(_, ids)| ids.as_slice())
                .collect();
            return merge_ascending(&lists)
                .filter(|id| self.matches(*id, filter))
                .take(limit)
                .collect();
        }
        self.entries
            .values()
            .filter(|e| matches_filter(e, filter))
            .map(|e| e.id)
            .take(limit)
            .collect()
    }

    fn matches(&self, id: u64, filter: &FilterClause) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| matches_filter(e, filter))
    }
}

/// Lazily merges ascending id lists into one ascending sequence.
fn merge_ascending<'a>(lists: &'a [&'a [u64]]) -> impl Iterator<Item = u64> + 'a {
    let mut heap: BinaryHeap<Reverse<(u64, usize, usize)>> = lists
        .iter()
        .enumerate()
        .filter_map(|(list, ids)| ids.first().map(|&id| Reverse((id, list, 0))))
        .collect();
    std::iter::from_fn(move || {
        let Reverse((id, list, pos)) = heap.pop()?;
        if let Some(&next) = lists[list].get(pos + 1) {
            heap.push(Reverse((next, list, pos + 1)));
        }
        Some(id)
    })
}

/// A thread-safe, indexed dictionary implementing [`DictionaryStore`].
///
/// Cloning a `Dictionary` produces a new handle to the same shared data.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub data: Arc<RwLock<DictionaryData>>,
    alphabet: Alphabet,
    wal: Option<Arc<SyncWriteAheadLog>>,
}

impl Dictionary {
    /// Creates an empty, memory-only dictionary.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            data: Arc::new(RwLock::new(DictionaryData::new(&alphabet))),
            alphabet,
            wal: None,
        }
    }

    /// Creates an empty dictionary that logs every committed batch to `wal`.
    pub fn with_wal(alphabet: Alphabet, wal: Arc<SyncWriteAheadLog>) -> Self {
        Self {
            wal: Some(wal),
            ..Self::new(alphabet)
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn wal(&self) -> Option<&Arc<SyncWriteAheadLog>> {
        self.wal.as_ref()
    }

    /// Replaces the contents with restored snapshot data.
    ///
    /// Fails if the snapshot was encoded with a different alphabet.
    pub fn restore(&self, restored: DictionaryData) -> io::Result<()> {
        if restored.alphabet != self.alphabet.to_string() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "snapshot alphabet '{}' differs from configured alphabet '{}'; reseed required",
                    restored.alphabet, self.alphabet
                ),
            ));
        }
        *self.data.write() = restored;
        Ok(())
    }

    /// Applies replayed WAL entries without logging them again.
    ///
    /// Batches that no longer pass the constraints are skipped with a warning.
    /// Returns the number of batches applied.
    pub fn replay_wal(&self, entries: Vec<WalEntry>) -> usize {
        let mut data = self.data.write();
        let mut applied = 0;
        for entry in entries {
            match entry {
                WalEntry::InsertBatch { entries: rows } => {
                    let foreign = rows
                        .iter()
                        .find(|r| self.alphabet.encode(&r.word) != r.letters);
                    if let Some(row) = foreign {
                        tracing::warn!(
                            word = %row.word,
                            "WAL batch encoded with a different alphabet, skipping"
                        );
                        continue;
                    }
                    match data.check_batch(&rows) {
                        Ok(()) => {
                            data.apply_batch(rows);
                            applied += 1;
                        }
                        Err(e) => tracing::warn!("WAL batch rejected on replay: {}", e),
                    }
                }
            }
        }
        applied
    }

    /// Writes a snapshot to `dir` and truncates the WAL.
    ///
    /// Holds the read lock for the duration, so no batch can be half-logged
    /// while the snapshot is taken.
    pub fn checkpoint(&self, dir: &str) -> io::Result<()> {
        let data = self.data.read();
        save_snapshot(&data, dir)?;
        if let Some(wal) = &self.wal {
            let _gate = wal.freeze();
            wal.truncate()?;
        }
        Ok(())
    }

    /// Looks up an entry by exact word.
    pub fn get_by_word(&self, word: &str) -> Option<DictionaryEntry> {
        let data = self.data.read();
        data.word_index
            .get(word)
            .and_then(|id| data.entries.get(id))
            .cloned()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.data.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct letter masks in the letters index.
    pub fn distinct_masks(&self) -> usize {
        self.data.read().letters_index.len()
    }
}

impl DictionaryStore for Dictionary {
    fn insert_batch(&self, rows: Vec<NewEntry>) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        data.check_batch(&rows)?;
        if rows.is_empty() {
            return Ok(0);
        }
        if let Some(wal) = &self.wal {
            wal.append(&WalEntry::InsertBatch {
                entries: rows.clone(),
            })?;
        }
        Ok(data.apply_batch(rows))
    }

    fn find_entry(&self, filter: &FilterClause) -> Result<Option<DictionaryEntry>, StoreError> {
        let data = self.data.read();
        Ok(data
            .select_ids(filter, 1)
            .first()
            .and_then(|id| data.entries.get(id))
            .cloned())
    }

    fn find_entries(
        &self,
        filter: &FilterClause,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>, StoreError> {
        let data = self.data.read();
        Ok(data
            .select_ids(filter, limit)
            .iter()
            .filter_map(|id| data.entries.get(id).cloned())
            .collect())
    }

    fn entry_count(&self) -> Result<usize, StoreError> {
        Ok(self.len())
    }
}
