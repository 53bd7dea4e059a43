//! Notification daemon.
//!
//! Reads push intents as JSON lines on stdin, keeps per-conversation
//! notification state in SQLite and writes rendered notifications as JSON
//! lines to stdout. Logs go to stderr.

use tokio::io::BufReader;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, reload};

use notifyd_lib::shutdown;

const VERBOSE_FILTER: &str = "info,notify_core=trace,notify_db=trace,notifyd=trace,notifyd_lib=trace";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Step 1: Tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, filter_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting notifyd");

    // Step 2: Foundation
    let (db, config, dir) = notifyd_lib::init_foundation()?;
    if config.log_always {
        if let Err(e) = filter_handle.modify(|f| *f = EnvFilter::new(VERBOSE_FILTER)) {
            tracing::warn!("Failed to enable verbose logging: {e}");
        }
    }
    tracing::debug!(data_dir = %dir.display(), "Foundation ready");

    // Step 3: Intake
    let receiver = notifyd_lib::build_stdout_receiver(db, &config);
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = notifyd_lib::run_intake(&receiver, stdin) => {
            if let Err(e) = result {
                tracing::error!("Intake failed: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    shutdown::graceful_shutdown(&receiver).await;
    Ok(())
}
