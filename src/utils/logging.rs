//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The browser owns the terminal, so events always go to `mandex.log` in the
//! app data directory. Non-interactive commands can additionally mirror
//! warnings to stderr. The filter is read from `MANDEX_LOG` (e.g.
//! `MANDEX_LOG=mandex=debug`), defaulting to `info`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE: &str = "mandex.log";
const LOG_ENV: &str = "MANDEX_LOG";

/// Where log events are written besides the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Interactive session: the log file only
    FileOnly,
    /// Command-line run: log file plus warnings on stderr
    FileAndStderr,
}

/// Install the global subscriber. Returns the log file path.
pub fn init_logging(target: LogTarget) -> Result<PathBuf> {
    let log_path = super::get_app_data_dir()?.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    let stderr_layer = (target == LogTarget::FileAndStderr).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(log_path)
}
