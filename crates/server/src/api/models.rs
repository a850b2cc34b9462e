//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling via Axum.

use serde::{Deserialize, Serialize};

/// Optional request body for `POST /db/seed`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRequest {
    /// Lines per batch; defaults to the server's configured batch size.
    pub batch_size: Option<usize>,
    /// Batch index to resume from; defaults to 0.
    pub start_batch: Option<u64>,
}

/// Response body for a completed seed.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub message: String,
    pub elapsed_ms: u64,
    pub batches_committed: u64,
    pub words_inserted: u64,
    pub lines_read: u64,
}

/// Query string for `GET /words/:word/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub letters: Option<String>,
}

/// Response body for `GET /words/:word/validate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub word: String,
    pub valid: bool,
    /// Store lookup time in milliseconds.
    pub elapsed_ms: f64,
}

/// Query string for `GET /words/formable`.
#[derive(Debug, Deserialize)]
pub struct FormableQuery {
    pub letters: Option<String>,
    pub limit: Option<usize>,
}

/// Response body for `GET /words/formable`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormableResponse {
    pub letters: String,
    pub words: Vec<String>,
    pub count: usize,
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub entries: usize,
    pub distinct_masks: usize,
    pub alphabet_size: usize,
    pub wal_size_bytes: u64,
    pub seed_running: bool,
}
