//! Tracing setup.
//!
//! Events go to a daily rotated file instead of the terminal, so log lines
//! never interleave with the prompt or command output.

use anyhow::{Context, Result};
use std::any::Any;
use std::panic;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "demido_shell=info,warn";

const LOG_FILE_PREFIX: &str = "demido-shell.log";

/// Install the global subscriber.
///
/// Logs are written under the platform local data directory, e.g.
/// `~/.local/share/demido-shell/logs/` on Linux. The level is taken from
/// `RUST_LOG` (`RUST_LOG=demido_shell=debug` for dispatch details).
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "demido shell starting");
    tracing::debug!(log_dir = %log_dir.display(), "logging to file");
    Ok(())
}

fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("could not determine the local data directory")?;
    Ok(base.join("demido-shell").join("logs"))
}

/// Where log files are written, for showing to the user.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

/// Route panic reports to the log file instead of stderr.
///
/// Handler panics are already reported on the shell output by the
/// interpreter; the default hook would print them a second time over the
/// prompt.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(%location, "panic: {}", panic_payload(info.payload()));
    }));
}

pub(crate) fn panic_payload(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

pub fn shutdown() {
    tracing::info!("demido shell shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_layout() {
        let dir = log_directory().unwrap();
        assert!(dir.ends_with("demido-shell/logs"));
    }

    #[test]
    fn test_panic_payload_text() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_payload(owned.as_ref()), "owned");
        assert_eq!(panic_payload(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_payload(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
