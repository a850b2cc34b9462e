use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tiledict_core::alphabet::Alphabet;
use tiledict_core::config;
use tiledict_core::ingest::{IngestOptions, Ingestor};
use tiledict_core::storage::{load_snapshot_from_dir, Dictionary, SyncWriteAheadLog};
use tiledict_server::api::create_router;
use tiledict_server::api::handlers::AppState;
use tiledict_server::api::metrics::{self, MetricsObserver};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tiledict", about = "Dictionary word-validation service for letter-tile games")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TILEDICT_PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Data directory for the WAL and snapshots
    #[arg(short, long, env = "TILEDICT_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Word list used by POST /db/seed (one word per line)
    #[arg(long, env = "TILEDICT_SEED_FILE", default_value = config::DEFAULT_SEED_FILE)]
    seed_file: PathBuf,

    /// Default number of lines per committed batch
    #[arg(long, env = "TILEDICT_BATCH_SIZE", default_value_t = config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seed from the word list at startup when the dictionary is empty
    #[arg(long, env = "TILEDICT_SEED_ON_START", default_value_t = false)]
    seed_on_start: bool,

    /// Fail startup if WAL replay encounters errors (strict mode)
    #[arg(long, default_value_t = false)]
    wal_strict: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tiledict_server=info".parse()?)
                .add_directive("tiledict_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    if args.batch_size == 0 || args.batch_size > config::MAX_BATCH_SIZE {
        eprintln!(
            "Error: batch size must be 1-{}",
            config::MAX_BATCH_SIZE
        );
        std::process::exit(1);
    }
    let data_path = std::path::Path::new(&args.data_dir);
    if data_path.exists() && !data_path.is_dir() {
        eprintln!(
            "Error: data_dir '{}' exists but is not a directory",
            args.data_dir
        );
        std::process::exit(1);
    }

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let alphabet = Alphabet::polish().clone();
    let wal = Arc::new(SyncWriteAheadLog::new(&args.data_dir)?);
    let dictionary = Dictionary::with_wal(alphabet.clone(), wal.clone());

    // Load the dictionary snapshot from disk
    match load_snapshot_from_dir(&args.data_dir, &alphabet) {
        Ok(Some(data)) => {
            let entries = data.entries.len();
            dictionary.restore(data)?;
            tracing::info!(entries, "Restored dictionary snapshot");
        }
        Ok(None) => tracing::info!("No snapshot found, starting empty"),
        Err(e) => {
            eprintln!("Error: could not load snapshot: {}", e);
            std::process::exit(1);
        }
    }

    // Replay batches committed after the last snapshot
    match wal.replay() {
        Ok((entries, stats)) => {
            if stats.has_errors() {
                tracing::warn!(
                    "WAL replay stats: {} ok, {} skipped, {} CRC errors, truncated={}, {} bytes cut",
                    stats.success,
                    stats.skipped,
                    stats.crc_errors,
                    stats.truncated,
                    stats.discarded_bytes
                );
                if args.wal_strict {
                    eprintln!(
                        "Error: WAL replay encountered errors (strict mode). \
                         {} CRC errors, {} skipped, truncated={}. \
                         The unreadable tail was moved to {}. \
                         Inspect it or restart without --wal-strict.",
                        stats.crc_errors,
                        stats.skipped,
                        stats.truncated,
                        wal.tail_path().display()
                    );
                    std::process::exit(1);
                }
            }
            if !entries.is_empty() {
                let total = entries.len();
                tracing::info!("Replaying {} WAL entries", total);
                let applied = dictionary.replay_wal(entries);
                tracing::info!("WAL replay complete: {applied}/{total} batches applied");
            }
        }
        Err(e) => {
            if args.wal_strict {
                eprintln!(
                    "Error: WAL replay failed (strict mode): {}. \
                     Fix the WAL or restart without --wal-strict.",
                    e
                );
                std::process::exit(1);
            }
            tracing::warn!("WAL replay failed: {}", e);
        }
    }

    if args.seed_on_start {
        if dictionary.is_empty() {
            let store = dictionary.clone();
            let seed_file = args.seed_file.clone();
            let options = IngestOptions::new(args.batch_size, 0);
            let started = Instant::now();
            let result = tokio::task::spawn_blocking(move || {
                let alphabet = store.alphabet().clone();
                Ingestor::new(store, alphabet)
                    .with_observer(MetricsObserver)
                    .ingest_file(&seed_file, &options)
            })
            .await?;
            match result {
                Ok(report) => tracing::info!(
                    words = report.words_inserted,
                    "Seed completed in {} ms",
                    started.elapsed().as_millis()
                ),
                Err(e) => tracing::error!(
                    resume_from_batch = ?e.resume_from_batch(),
                    "Startup seed failed: {}",
                    e
                ),
            }
        } else {
            tracing::info!("Dictionary already populated, skipping startup seed");
        }
    }

    let state = AppState::new(
        dictionary.clone(),
        args.data_dir.clone(),
        args.seed_file.clone(),
        prometheus_handle,
    )
    .with_batch_size(args.batch_size);

    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", args.port);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        data_dir = %args.data_dir,
        seed_file = %args.seed_file.display(),
        batch_size = args.batch_size,
        entries = dictionary.len(),
        alphabet = %alphabet,
        "tiledict ready"
    );

    // Spawn dictionary metrics background task
    let metrics_dictionary = dictionary.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            metrics::update_dictionary_metrics(&metrics_dictionary);
        }
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    flush_and_shutdown(dictionary, args.data_dir, args.shutdown_timeout).await;

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}

async fn flush_and_shutdown(dictionary: Dictionary, data_dir: String, timeout_secs: u64) {
    tracing::info!("All requests drained, flushing data...");

    let entries = dictionary.len();
    let flush = tokio::task::spawn_blocking(move || dictionary.checkpoint(&data_dir));
    match tokio::time::timeout(Duration::from_secs(timeout_secs), flush).await {
        Ok(Ok(Ok(()))) => tracing::info!(entries, "Snapshot saved on shutdown, WAL truncated"),
        Ok(Ok(Err(e))) => {
            tracing::error!("Failed to save snapshot: {} (WAL preserved for recovery)", e)
        }
        Ok(Err(e)) => tracing::error!("Shutdown flush task failed: {}", e),
        Err(_) => tracing::error!(
            "Shutdown flush timeout ({}s) exceeded, WAL preserved for recovery",
            timeout_secs
        ),
    }
}
