//! Diagnostic logging via `tracing`.
//!
//! The interactive UI owns the terminal, so diagnostics only go to a file
//! there (when `--log` is given). One-shot commands log to stderr.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter used for the log file when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Filter used on stderr when `RUST_LOG` is not set, so one-shot output stays
/// readable.
pub const DEFAULT_STDERR_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Disabled,
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Call once, before any stream is opened.
pub fn init_logging(target: LogTarget<'_>) -> Result<(), Box<dyn Error>> {
    match target {
        LogTarget::File(path) => {
            let file = open_log_file(path)
                .map_err(|e| format!("Failed to open log file {}: {e}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(DEFAULT_LOG_FILTER))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| e as Box<dyn Error>)?;
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(DEFAULT_STDERR_FILTER))
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| e as Box<dyn Error>)?;
        }
        LogTarget::Disabled => {}
    }

    Ok(())
}
