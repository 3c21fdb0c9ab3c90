use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, TrainerError};

pub const LOG_FILE_NAME: &str = "hotkey-trainer.log";

/// Guard that must be kept alive for the duration of the program.
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Send all tracing output to `<log_dir>/hotkey-trainer.log`.
///
/// The terminal belongs to the drill screen, so nothing is written to stderr.
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init(log_dir: &Path) -> Result<LoggingGuard> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| TrainerError::Io(std::io::Error::other(e.to_string())))?;

    tracing::info!(log_path = %path.display(), "logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
