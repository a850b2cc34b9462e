//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics::{self, MetricsObserver};
use crate::api::models::*;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tiledict_core::config;
use tiledict_core::error::ValidationError;
use tiledict_core::ingest::{IngestOptions, Ingestor};
use tiledict_core::storage::Dictionary;
use tiledict_core::validator::Validator;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub dictionary: Dictionary,
    pub validator: Validator<Dictionary>,
    pub data_dir: String,
    /// Word list read by `POST /db/seed`.
    pub seed_file: PathBuf,
    /// Batch size used when a seed request does not name one.
    pub default_batch_size: usize,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
    /// Set while a seed run is in progress.
    pub seed_running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        dictionary: Dictionary,
        data_dir: String,
        seed_file: PathBuf,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        let validator = Validator::new(dictionary.clone(), dictionary.alphabet().clone());
        Self {
            dictionary,
            validator,
            data_dir,
            seed_file,
            default_batch_size: config::DEFAULT_BATCH_SIZE,
            prometheus_handle,
            start_time: Instant::now(),
            seed_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.default_batch_size = batch_size;
        self
    }
}

/// Clears the seed flag when the run ends, even if the blocking task panics.
struct SeedGuard(Arc<AtomicBool>);

impl SeedGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SeedGuard(flag.clone()))
    }
}

impl Drop for SeedGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let wal_size = state
        .dictionary
        .wal()
        .map(|w| w.size_bytes())
        .unwrap_or(0);

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            entries: state.dictionary.len(),
            distinct_masks: state.dictionary.distinct_masks(),
            alphabet_size: state.dictionary.alphabet().len(),
            wal_size_bytes: wal_size,
            seed_running: state.seed_running.load(Ordering::Acquire),
        }),
    )
}

/// `POST /db/seed`
///
/// Streams the configured word list into the dictionary. The body is optional;
/// an empty body seeds from batch 0 with the default batch size.
pub async fn seed(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SeedResponse>, ApiError> {
    let req: SeedRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SeedRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid seed request: {}", e)))?
    };

    let options = IngestOptions::new(
        req.batch_size.unwrap_or(state.default_batch_size),
        req.start_batch.unwrap_or(0),
    );
    options.validate()?;

    let guard = SeedGuard::acquire(&state.seed_running)
        .ok_or_else(|| ApiError::Conflict("A seed is already running".into()))?;

    let dictionary = state.dictionary.clone();
    let alphabet = dictionary.alphabet().clone();
    let seed_file = state.seed_file.clone();
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        Ingestor::new(dictionary, alphabet)
            .with_observer(MetricsObserver)
            .ingest_file(&seed_file, &options)
    })
    .await
    .map_err(|e| {
        tracing::error!("Seed task failed: {}", e);
        ApiError::Internal("Seed task failed".into())
    })?;

    metrics::update_dictionary_metrics(&state.dictionary);

    let report = result.map_err(|e| {
        tracing::error!(resume_from_batch = ?e.resume_from_batch(), "Seed failed: {}", e);
        ApiError::from(e)
    })?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        batches = report.batches_committed,
        words = report.words_inserted,
        elapsed_ms,
        "Seed completed"
    );
    Ok(Json(SeedResponse {
        message: format!("Seed completed in {} ms", elapsed_ms),
        elapsed_ms,
        batches_committed: report.batches_committed,
        words_inserted: report.words_inserted,
        lines_read: report.lines_read,
    }))
}

/// `GET /words/:word/validate?letters=...`
pub async fn validate_word(
    State(state): State<AppState>,
    Path(word): Path<String>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<ValidateResponse>, ApiError> {
    if word.len() > config::MAX_WORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Word exceeds maximum length of {} bytes",
            config::MAX_WORD_LEN
        )));
    }

    let validation = match state.validator.validate_word(&word, query.letters.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            if matches!(e, ValidationError::Store(_)) {
                metrics::record_validation("error");
            }
            return Err(e.into());
        }
    };

    metrics::record_validation(if validation.valid { "valid" } else { "invalid" });
    let elapsed_ms = validation.elapsed.as_secs_f64() * 1000.0;
    tracing::debug!(word = %word, valid = validation.valid, elapsed_ms, "Word validated");
    Ok(Json(ValidateResponse {
        word,
        valid: validation.valid,
        elapsed_ms,
    }))
}

/// `GET /words/formable?letters=...&limit=...`
pub async fn formable_words(
    State(state): State<AppState>,
    Query(query): Query<FormableQuery>,
) -> Result<Json<FormableResponse>, ApiError> {
    let limit = query.limit.unwrap_or(config::DEFAULT_FORMABLE_LIMIT);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be positive".into()));
    }

    let words = state
        .validator
        .formable_words(query.letters.as_deref(), limit)?;
    let count = words.len();
    Ok(Json(FormableResponse {
        letters: query.letters.unwrap_or_default(),
        words,
        count,
    }))
}

/// `POST /admin/snapshot`
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    if state.seed_running.load(Ordering::Acquire) {
        return Err(ApiError::Conflict(
            "Cannot snapshot while a seed is running".into(),
        ));
    }

    let dictionary = state.dictionary.clone();
    let data_dir = state.data_dir.clone();
    tokio::task::spawn_blocking(move || dictionary.checkpoint(&data_dir))
        .await
        .map_err(|e| {
            tracing::error!("Snapshot task failed: {}", e);
            ApiError::Internal("Snapshot failed".into())
        })?
        .map_err(|e| {
            tracing::error!("Failed to save snapshot: {}", e);
            ApiError::Internal("Snapshot failed".into())
        })?;

    let entries = state.dictionary.len();
    tracing::info!(entries, "Snapshot saved, WAL truncated");
    Ok(Json(MessageResponse {
        message: format!("Snapshot saved with {} entries", entries),
    }))
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    metrics::update_dictionary_metrics(&state.dictionary);
    state.prometheus_handle.render()
}

/// Fallback for unknown routes.
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
