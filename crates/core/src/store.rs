//! Record store boundary.
//!
//! The validator and the ingestion pipeline only talk to storage through
//! [`DictionaryStore`], which is passed to them at construction time. The
//! bundled implementation is [`Dictionary`](crate::storage::Dictionary); tests
//! substitute their own.

use crate::entry::{DictionaryEntry, NewEntry};
use crate::error::StoreError;
use crate::filter_types::FilterClause;
use std::sync::Arc;

/// A key-indexed record store for dictionary entries.
pub trait DictionaryStore: Send + Sync {
    /// Inserts all rows as one transaction: either every row becomes visible or none does.
    ///
    /// Fails with [`StoreError::DuplicateWord`] if any word already exists or appears
    /// twice in `rows`. Returns the number of rows inserted.
    fn insert_batch(&self, rows: Vec<NewEntry>) -> Result<usize, StoreError>;

    /// Returns one entry matching `filter`, or `None`.
    fn find_entry(&self, filter: &FilterClause) -> Result<Option<DictionaryEntry>, StoreError>;

    /// Returns up to `limit` entries matching `filter`, in ascending id order.
    fn find_entries(
        &self,
        filter: &FilterClause,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>, StoreError>;

    /// Number of committed entries.
    fn entry_count(&self) -> Result<usize, StoreError>;
}

impl<S: DictionaryStore + ?Sized> DictionaryStore for &S {
    fn insert_batch(&self, rows: Vec<NewEntry>) -> Result<usize, StoreError> {
        (**self).insert_batch(rows)
    }

    fn find_entry(&self, filter: &FilterClause) -> Result<Option<DictionaryEntry>, StoreError> {
        (**self).find_entry(filter)
    }

    fn find_entries(
        &self,
        filter: &FilterClause,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>, StoreError> {
        (**self).find_entries(filter, limit)
    }

    fn entry_count(&self) -> Result<usize, StoreError> {
        (**self).entry_count()
    }
}

impl<S: DictionaryStore + ?Sized> DictionaryStore for Arc<S> {
    fn insert_batch(&self, rows: Vec<NewEntry>) -> Result<usize, StoreError> {
        (**self).insert_batch(rows)
    }

    fn find_entry(&self, filter: &FilterClause) -> Result<Option<DictionaryEntry>, StoreError> {
        (**self).find_entry(filter)
    }

    fn find_entries(
        &self,
        filter: &FilterClause,
        limit: usize,
    ) -> Result<Vec<DictionaryEntry>, StoreError> {
        (**self).find_entries(filter, limit)
    }

    fn entry_count(&self) -> Result<usize, StoreError> {
        (**self).entry_count()
    }
}
