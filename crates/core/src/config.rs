//! Global configuration constants for tiledict.
//!
//! Input validation limits, ingestion defaults, and server defaults are defined here.
//! These are compile-time constants; runtime configuration is handled via CLI arguments
//! and environment variables in the server's `main.rs`.

/// Default number of source lines committed per ingestion transaction.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Maximum accepted ingestion batch size.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Maximum stored word length in bytes.
pub const MAX_WORD_LEN: usize = 255;

/// Default limit for formable-word listings.
pub const DEFAULT_FORMABLE_LIMIT: usize = 100;

/// Maximum number of words returned by a single formable-word listing.
pub const MAX_FORMABLE_LIMIT: usize = 10_000;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory for WAL and snapshot files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default word list used by `POST /db/seed`.
pub const DEFAULT_SEED_FILE: &str = "./temp/words.txt";

/// WAL file name inside the data directory.
pub const WAL_FILE_NAME: &str = "wal.bin";

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "dictionary.tdb";

/// Per-request timeout in seconds. Does not apply to seeding.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Global rate limit in requests per second.
pub const RATE_LIMIT_RPS: u64 = 1_000;

/// Maximum HTTP request body size in bytes (64 KB).
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
