//! Tracing setup for Eventide.
//!
//! Provides dual output: console logs at a caller-controlled level and
//! full debug logs to disk, so a failed simulation run can always be
//! reconstructed from the file even when the console was quiet.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initializes tracing with dual output: console (caller level) + file
/// (full debug).
///
/// Writes complete debug logs to `logs/eventide-last-run.log` under
/// `logs_dir` (default `./logs`), overwriting the previous run.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - logs directory cannot be created or
///   the log file cannot be opened for writing
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join("eventide-last-run.log");
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    // File layer always captures everything at TRACE level.
    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one test may install the global subscriber per process.
    #[test]
    fn init_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        init_tracing(Level::INFO, Some(dir.path())).unwrap();

        tracing::debug!("captured by the file layer");
        assert!(dir.path().join("eventide-last-run.log").exists());
    }
}
