//! The ingestion pipeline.
//!
//! Line `n` (zero-based) of the source belongs to batch `n / batch_size`. A run
//! with `start_batch = k` skips the first `k * batch_size` lines, then commits
//! batches `k, k + 1, ...` in source order. Each batch goes to the store as one
//! [`insert_batch`](DictionaryStore::insert_batch) call, so a failed batch
//! leaves nothing behind and its index is the place to resume from.

use crate::alphabet::Alphabet;
use crate::config;
use crate::entry::NewEntry;
use crate::error::{IngestError, StoreError};
use crate::ingest::lines::LineSource;
use crate::store::DictionaryStore;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Batch size and resume offset for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Lines per committed batch. Must be in `1..=MAX_BATCH_SIZE`.
    pub batch_size: usize,
    /// First batch index to commit; earlier batches are skipped.
    pub start_batch: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: config::DEFAULT_BATCH_SIZE,
            start_batch: 0,
        }
    }
}

impl IngestOptions {
    pub fn new(batch_size: usize, start_batch: u64) -> Self {
        Self {
            batch_size,
            start_batch,
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.batch_size == 0 || self.batch_size > config::MAX_BATCH_SIZE {
            return Err(IngestError::InvalidOptions(format!(
                "batch_size must be 1-{}",
                config::MAX_BATCH_SIZE
            )));
        }
        Ok(())
    }
}

/// Receives per-batch progress signals.
pub trait IngestObserver {
    /// Called before a batch is committed. `words` excludes blank lines.
    fn batch_started(&self, _index: u64, _words: usize) {}

    /// Called after a batch has been committed.
    fn batch_committed(&self, _index: u64, _inserted: usize, _elapsed: Duration) {}

    /// Called when a batch commit fails. The run stops after this.
    fn batch_failed(&self, _index: u64, _error: &StoreError) {}
}

/// Logs batch progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl IngestObserver for TracingObserver {
    fn batch_started(&self, index: u64, words: usize) {
        tracing::info!(batch = index, words, "Inserting batch {}...", index);
    }

    fn batch_committed(&self, index: u64, inserted: usize, elapsed: Duration) {
        tracing::info!(
            batch = index,
            inserted,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch {} inserted.",
            index
        );
    }

    fn batch_failed(&self, index: u64, error: &StoreError) {
        tracing::error!(batch = index, "Batch {} failed: {}", index, error);
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub batches_committed: u64,
    pub words_inserted: u64,
    /// Lines consumed from the source, including skipped ones.
    pub lines_read: u64,
    pub lines_skipped: u64,
    /// The `start_batch` of the run.
    pub first_batch: u64,
    /// Index of the last committed batch, if any.
    pub last_batch: Option<u64>,
    pub elapsed: Duration,
}

/// Streams a word list into a [`DictionaryStore`].
#[derive(Debug, Clone)]
pub struct Ingestor<S, O = TracingObserver> {
    store: S,
    alphabet: Alphabet,
    observer: O,
}

impl<S: DictionaryStore> Ingestor<S> {
    pub fn new(store: S, alphabet: Alphabet) -> Self {
        Self {
            store,
            alphabet,
            observer: TracingObserver,
        }
    }
}

impl<S: DictionaryStore, O: IngestObserver> Ingestor<S, O> {
    /// Replaces the progress observer.
    pub fn with_observer<P: IngestObserver>(self, observer: P) -> Ingestor<S, P> {
        Ingestor {
            store: self.store,
            alphabet: self.alphabet,
            observer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens `path` and ingests it.
    pub fn ingest_file(
        &self,
        path: &Path,
        options: &IngestOptions,
    ) -> Result<IngestReport, IngestError> {
        options.validate()?;
        let file = File::open(path).map_err(|source| IngestError::Source {
            resume_from_batch: options.start_batch,
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            batch_size = options.batch_size,
            start_batch = options.start_batch,
            "Starting ingestion"
        );
        self.ingest(BufReader::new(file), options)
    }

    /// Ingests one word per line from `source`.
    pub fn ingest<R: BufRead>(
        &self,
        source: R,
        options: &IngestOptions,
    ) -> Result<IngestReport, IngestError> {
        options.validate()?;
        let started = Instant::now();
        let batch_size = options.batch_size;
        let mut lines = LineSource::new(source);
        let mut report = IngestReport {
            first_batch: options.start_batch,
            ..IngestReport::default()
        };

        let to_skip = options.start_batch.saturating_mul(batch_size as u64);
        report.lines_skipped = lines
            .skip_lines(to_skip)
            .map_err(|source| IngestError::Source {
                resume_from_batch: options.start_batch,
                source,
            })?;
        if report.lines_skipped < to_skip {
            tracing::warn!(
                start_batch = options.start_batch,
                lines = report.lines_skipped,
                "Source ended before the start batch; nothing to ingest"
            );
        }

        let mut current = options.start_batch;
        let mut buffer: Vec<String> = Vec::with_capacity(batch_size);
        loop {
            let line = lines.next_line().map_err(|source| IngestError::Source {
                resume_from_batch: current,
                source,
            })?;
            let Some(line) = line else { break };
            buffer.push(line);
            if buffer.len() >= batch_size {
                self.commit(current, &mut buffer, &mut report)?;
                current += 1;
            }
        }
        if !buffer.is_empty() {
            self.commit(current, &mut buffer, &mut report)?;
        }

        report.lines_read = lines.lines_read();
        report.elapsed = started.elapsed();
        tracing::info!(
            batches = report.batches_committed,
            words = report.words_inserted,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Ingestion complete"
        );
        Ok(report)
    }

    fn commit(
        &self,
        index: u64,
        buffer: &mut Vec<String>,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        let rows: Vec<NewEntry> = buffer
            .drain(..)
            .filter_map(|line| {
                let word = line.trim();
                (!word.is_empty()).then(|| NewEntry::encode(word, &self.alphabet))
            })
            .collect();

        self.observer.batch_started(index, rows.len());
        let started = Instant::now();
        let inserted = self.store.insert_batch(rows).map_err(|source| {
            self.observer.batch_failed(index, &source);
            IngestError::Store {
                resume_from_batch: index,
                source,
            }
        })?;
        self.observer.batch_committed(index, inserted, started.elapsed());

        report.batches_committed += 1;
        report.words_inserted += inserted as u64;
        report.last_batch = Some(index);
        Ok(())
    }
}
