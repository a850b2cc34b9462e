//! # tiledict-core
//!
//! Dictionary engine for a letter-tile word game: a fixed-alphabet letter
//! presence codec, a subset validator over an indexed word store, and a
//! resumable batch ingestion pipeline.
//!
//! This is the core library crate with zero async dependencies. The HTTP
//! service lives in `tiledict-server`.

/// Alphabet definition and the letter presence bitmask codec.
pub mod alphabet;
/// Global configuration constants: limits, defaults, and file names.
pub mod config;
/// Dictionary entry types.
pub mod entry;
/// Error types for storage, validation, and ingestion.
pub mod error;
/// Filter types used by the validator and storage layers.
pub mod filter_types;
/// Batch ingestion: line source and the resumable pipeline.
pub mod ingest;
/// Filter evaluation.
pub mod search;
/// Storage layer: in-memory dictionary, write-ahead log, and disk persistence.
pub mod storage;
/// The record store boundary trait.
pub mod store;
/// Word validation against available letters.
pub mod validator;

pub use alphabet::{Alphabet, AlphabetError, LetterMask};
pub use entry::{DictionaryEntry, NewEntry};
pub use error::{IngestError, StoreError, ValidationError};
pub use filter_types::{FilterClause, FilterCondition};
pub use ingest::{IngestObserver, IngestOptions, IngestReport, Ingestor, TracingObserver};
pub use storage::Dictionary;
pub use store::DictionaryStore;
pub use validator::{Validation, Validator};
