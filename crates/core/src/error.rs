//! Error types for the tiledict core library.
//!
//! # Error Categories
//!
//! - [`StoreError`]: record store failures, including constraint violations
//! - [`ValidationError`]: client input errors and store failures during validation
//! - [`IngestError`]: ingestion failures, carrying the batch index to resume from

use std::fmt;
use std::io;

/// Failure reported by a [`DictionaryStore`](crate::store::DictionaryStore).
#[derive(Debug)]
pub enum StoreError {
    /// Unique constraint on `word` violated.
    DuplicateWord { word: String },

    /// Word longer than [`MAX_WORD_LEN`](crate::config::MAX_WORD_LEN) bytes.
    WordTooLong { word: String, len: usize },

    /// WAL or snapshot I/O failure.
    Io(io::Error),

    /// Store could not serve the request.
    Unavailable(String),
}

impl StoreError {
    /// True for uniqueness and length violations, which retrying will not fix.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateWord { .. } | StoreError::WordTooLong { .. }
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateWord { word } => {
                write!(f, "duplicate key value violates unique constraint: word '{}'", word)
            }
            StoreError::WordTooLong { word, len } => write!(
                f,
                "word '{}' is {} bytes, exceeds maximum of {}",
                word,
                len,
                crate::config::MAX_WORD_LEN
            ),
            StoreError::Io(e) => write!(f, "store I/O error: {}", e),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Failure of a word validation request.
///
/// Distinct from a negative result: `Ok(valid: false)` means the lookup ran and
/// found nothing; an `Err` means no answer could be given.
#[derive(Debug)]
pub enum ValidationError {
    /// The available-letters argument was missing or empty.
    MissingLetters,

    /// The store failed while evaluating the lookup.
    Store(StoreError),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingLetters => write!(f, "available letters are required"),
            ValidationError::Store(e) => write!(f, "validation failed: {}", e),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::Store(e) => Some(e),
            ValidationError::MissingLetters => None,
        }
    }
}

impl From<StoreError> for ValidationError {
    fn from(e: StoreError) -> Self {
        ValidationError::Store(e)
    }
}

/// Failure of an ingestion run.
///
/// Batches before `resume_from_batch` are committed; passing it back as
/// `start_batch` continues where the run stopped.
#[derive(Debug)]
pub enum IngestError {
    /// Options rejected before reading the source.
    InvalidOptions(String),

    /// Reading the source failed.
    Source {
        resume_from_batch: u64,
        source: io::Error,
    },

    /// Committing a batch failed; no row of that batch is visible.
    Store {
        resume_from_batch: u64,
        source: StoreError,
    },
}

impl IngestError {
    /// Batch index to pass as `start_batch` when retrying, if any batch was attempted.
    pub fn resume_from_batch(&self) -> Option<u64> {
        match self {
            IngestError::InvalidOptions(_) => None,
            IngestError::Source {
                resume_from_batch, ..
            }
            | IngestError::Store {
                resume_from_batch, ..
            } => Some(*resume_from_batch),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::InvalidOptions(msg) => write!(f, "invalid ingest options: {}", msg),
            IngestError::Source {
                resume_from_batch,
                source,
            } => write!(
                f,
                "reading word list failed in batch {}: {}",
                resume_from_batch, source
            ),
            IngestError::Store {
                resume_from_batch,
                source,
            } => write!(f, "batch {} failed: {}", resume_from_batch, source),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::InvalidOptions(_) => None,
            IngestError::Source { source, .. } => Some(source),
            IngestError::Store { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_offset_reported() {
        let err = IngestError::Store {
            resume_from_batch: 7,
            source: StoreError::DuplicateWord { word: "kot".into() },
        };
        assert_eq!(err.resume_from_batch(), Some(7));
        assert!(err.to_string().contains("batch 7"));
        assert!(err.to_string().contains("kot"));
        assert_eq!(
            IngestError::InvalidOptions("x".into()).resume_from_batch(),
            None
        );
    }

    #[test]
    fn test_constraint_violation_classification() {
        assert!(StoreError::DuplicateWord { word: "a".into() }.is_constraint_violation());
        assert!(StoreError::WordTooLong {
            word: "a".into(),
            len: 300
        }
        .is_constraint_violation());
        assert!(!StoreError::Unavailable("down".into()).is_constraint_violation());
        assert!(!StoreError::from(io::Error::other("disk")).is_constraint_violation());
    }
}
