//! tiledict-server: HTTP server for the tiledict word-validation service.
//!
//! Provides the REST API. Core dictionary logic lives in `tiledict-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
