//! Storage layer: the in-memory dictionary, write-ahead log, and snapshots.
//!
//! Entries live in memory in a [`Dictionary`]. Durability is provided by a
//! `SyncWriteAheadLog` (one CRC32-framed record per committed batch, fsynced)
//! and bincode snapshots (atomic temp-file + rename).

/// Dictionary data structures and the `DictionaryStore` implementation.
pub mod dictionary;
/// Disk persistence: snapshot save/load with atomic writes.
pub mod persistence;
/// Write-Ahead Log with CRC32 checksums.
pub mod wal;

pub use dictionary::{Dictionary, DictionaryData};
pub use persistence::{load_snapshot, load_snapshot_from_dir, save_snapshot};
pub use wal::{ReplayStats, SyncWriteAheadLog, WalEntry};
