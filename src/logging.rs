//! Logging setup.
//!
//! Every invocation appends to the configured log file. The level can be
//! changed with `RUST_LOG`, e.g. `RUST_LOG=lectern=debug,lectern_core=debug`.

use std::io;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "lectern=info,lectern_core=info";
const TIMESTAMP_FORMAT: &str = "%F %T";

/// Initialize logging to `log_file`, appending to it.
pub fn init(log_file: &Path) -> io::Result<()> {
    let directory = log_file
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file name"))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_timer(fmt::time::ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(file_appender);

    fmt_layer
        .with_subscriber(Registry::default().with(env_filter()))
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Fallback when the log file is unusable: log to stderr so the supervisor
/// can capture it. Stdout belongs to the connection.
pub fn init_stderr() {
    let _ = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_timer(fmt::time::ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_writer(io::stderr)
        .with_subscriber(Registry::default().with(env_filter()))
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
