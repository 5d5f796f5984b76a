//! Logging initialisation
//!
//! Sets up `tracing` for the command-line front end:
//! - Human-readable events on stderr (stdout is reserved for command output)
//! - An optional JSON file log with daily rotation
//! - `log` crate events (config loading) forwarded into `tracing`

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::config::LoggingConfig;

/// File name prefix of the rolling log.
pub const LOG_FILE_PREFIX: &str = "gamebook-companion.log";

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns the file writer's `WorkerGuard` when file logging is enabled; it
/// must be kept alive until exit so buffered lines are flushed.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let (file_layer, guard) = if config.log_to_file {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // JSON for easy parsing
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_target(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_target(false);

    let subscriber = tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(stderr_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
        return guard;
    }

    // Redirect `log` macros to `tracing`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    if config.log_to_file {
        tracing::debug!(dir = %log_dir.display(), "File logging enabled (daily rolling)");
    }

    guard
}
