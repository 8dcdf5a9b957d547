//! Logging setup for DataWhisperer.
//!
//! The TUI owns the terminal, so in that mode logs go to a file in the
//! platform state directory. Headless runs log to stderr and keep stdout
//! for replies.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` if set, otherwise `default`.
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initializes logging for TUI mode.
///
/// The file is truncated on every start. If it cannot be created, logging
/// stays disabled rather than writing over the UI.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {}: {e}", log_path.display());
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging for headless mode.
///
/// The default level is `warn` so scripted runs only see connection
/// failures and refusals on stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the path for the log file.
///
/// `~/.local/state/datawhisperer/datawhisperer.log` on Linux, the config
/// directory where there is no state directory, else the temp directory.
pub fn get_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("datawhisperer").join("datawhisperer.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("datawhisperer.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_absolute() {
        assert!(get_log_path().is_absolute());
    }

    #[test]
    fn test_log_path_file_name() {
        assert!(get_log_path().ends_with("datawhisperer.log"));
    }
}
