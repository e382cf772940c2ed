use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking,
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// The directory where the logs are stored.
const LOGS: &str = "./logs";
/// The log file name of the decryption tool.
const LOG_FILE: &str = "secret-decrypt.log";
/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn,secret_decrypt=info";

/// Configure logging with JSON file output and console output
///
/// The console layer writes to stderr so that stdout only carries the
/// decrypted JSON.
///
/// # Errors
///
/// Returns an error if:
/// - Failed to create logs directory
/// - Failed to set global default subscriber
pub fn setup_logging() -> Result<WorkerGuard> {
    std::fs::create_dir_all(LOGS).context("Failed to create logs directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOGS, LOG_FILE);
    let (file_non_blocking, file_guard) = non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(file_non_blocking)
        .with_filter(EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .pretty()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_span_events(FmtSpan::ENTER)
        .with_writer(std::io::stderr);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to set global default subscriber")?;

    Ok(file_guard)
}
