//! Logging Setup
//!
//! Installs the process-wide subscriber once at startup: a console layer on
//! stderr and a daily-rolling file layer. The returned guard must be held
//! until shutdown so the non-blocking file writer flushes its buffer.

use crate::config::LogSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rotating log file name (date suffix appended per day)
const LOG_FILE: &str = "battery-telemetry.log";

/// Initialize logging; call exactly once.
pub fn init(settings: &LogSettings) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(&settings.directory, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}
