pub mod config;
pub mod push;
pub mod shutdown;
pub mod sink;
pub mod titles;

use std::path::PathBuf;
use std::sync::Arc;

use notify_core::{Aggregator, NotificationSink};
use notify_db::Database;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use config::{AppConfig, SettingsManager};
use push::PushReceiver;
use sink::JsonLinesSink;
use titles::TitleCache;

/// Determine the data directory for the daemon.
/// Priority: NOTIFYD_DATA_DIR env var > ~/.notifyd
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("NOTIFYD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".notifyd")
}

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Initialize DB, migrate settings, load config.
pub fn init_foundation() -> Result<(Database, AppConfig, PathBuf), anyhow::Error> {
    load_dotenv();

    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    let db_path = dir.join("notifications.db");

    tracing::info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path)?;

    let sm = SettingsManager::new(db.clone());

    // Migrate settings from environment variables (one-time)
    if let Err(e) = sm.migrate_from_env() {
        tracing::error!("Failed to migrate from env: {e}");
    }

    sm.initialize_defaults()?;

    let config = AppConfig::load(&sm)?;
    tracing::info!(
        max_lines = config.max_lines,
        policy = ?config.suppressed_policy,
        output = ?config.output,
        "Configuration loaded"
    );

    Ok((db, config, dir))
}

/// Wire the aggregator to its collaborators and wrap it in a receiver.
/// Called inside a Tokio runtime, this also starts the clear worker.
pub fn build_receiver(
    db: Database,
    sink: Arc<dyn NotificationSink>,
    config: &AppConfig,
) -> PushReceiver {
    let titles = Arc::new(TitleCache::new());
    let aggregator = Aggregator::new(
        Arc::new(db),
        sink,
        titles.clone(),
        config.aggregator_config(),
    );
    aggregator.start_clear_worker();
    PushReceiver::new(aggregator, titles, config.cancel_action())
}

/// Receiver writing notifications to stdout according to `config.output`.
pub fn build_stdout_receiver(db: Database, config: &AppConfig) -> PushReceiver {
    build_receiver(db, Arc::new(JsonLinesSink::stdout(config.output)), config)
}

/// Feed newline-delimited intents from `reader` into `receiver` until EOF.
/// Returns the number of lines read.
pub async fn run_intake<R>(receiver: &PushReceiver, reader: R) -> Result<usize, anyhow::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0usize;
    while let Some(line) = lines.next_line().await? {
        count += 1;
        receiver.handle_line(&line);
    }
    tracing::info!(lines = count, "Intake finished");
    Ok(count)
}
