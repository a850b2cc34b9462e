//! Batched, resumable dictionary ingestion.
//!
//! A word list is read line by line, grouped into fixed-size batches, encoded,
//! and committed one atomic batch at a time. A run can start at any batch
//! index; earlier lines are read past without being decoded or buffered.

/// Lazy line reader with skip support.
pub mod lines;
/// The ingestion pipeline, its options, observers, and report.
pub mod pipeline;

pub use lines::LineSource;
pub use pipeline::{IngestObserver, IngestOptions, IngestReport, Ingestor, TracingObserver};
