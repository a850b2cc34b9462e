//! Prometheus metrics recording and background collection.

use metrics::{counter, gauge, histogram};
use std::time::Duration;
use tiledict_core::error::StoreError;
use tiledict_core::ingest::{IngestObserver, TracingObserver};
use tiledict_core::storage::Dictionary;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records a validation outcome: `valid`, `invalid`, or `error`.
pub fn record_validation(result: &'static str) {
    counter!("tiledict_validations_total", "result" => result).increment(1);
}

/// Updates the `tiledict_dictionary_entries` gauge.
pub fn update_dictionary_metrics(dictionary: &Dictionary) {
    gauge!("tiledict_dictionary_entries").set(dictionary.len() as f64);
    if let Some(wal) = dictionary.wal() {
        gauge!("tiledict_wal_size_bytes").set(wal.size_bytes() as f64);
    }
}

/// Ingestion observer that logs like [`TracingObserver`] and records batch counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl IngestObserver for MetricsObserver {
    fn batch_started(&self, index: u64, words: usize) {
        TracingObserver.batch_started(index, words);
    }

    fn batch_committed(&self, index: u64, inserted: usize, elapsed: Duration) {
        TracingObserver.batch_committed(index, inserted, elapsed);
        counter!("tiledict_ingest_batches_total", "status" => "committed").increment(1);
        counter!("tiledict_ingest_words_total").increment(inserted as u64);
        histogram!("tiledict_ingest_batch_duration_seconds").record(elapsed.as_secs_f64());
    }

    fn batch_failed(&self, index: u64, error: &StoreError) {
        TracingObserver.batch_failed(index, error);
        counter!("tiledict_ingest_batches_total", "status" => "failed").increment(1);
    }
}
