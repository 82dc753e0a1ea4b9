//! Error types for the shell.
//!
//! Command handlers report failures as [`anyhow::Error`]; everything the
//! interpreter itself can run into is a [`ShellError`].

use rustyline::error::ReadlineError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The terminal could not be read from.
    #[error("input error: {0}")]
    Input(#[from] ReadlineError),

    /// A command handler returned an error.
    #[error("command `{name}` failed: {source:#}")]
    HandlerFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A command handler panicked.
    #[error("command `{name}` panicked: {message}")]
    HandlerPanicked { name: String, message: String },

    /// A command handler did not settle in time and was cancelled.
    #[error("command `{name}` timed out after {}s", after.as_secs_f64())]
    HandlerTimedOut { name: String, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock shared with an adapter was poisoned by a panic.
    #[error("shared state poisoned")]
    Poisoned,
}

impl ShellError {
    /// Name of the command involved, for handler failures.
    pub fn command(&self) -> Option<&str> {
        match self {
            ShellError::HandlerFailed { name, .. }
            | ShellError::HandlerPanicked { name, .. }
            | ShellError::HandlerTimedOut { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_failed_message_includes_cause_chain() {
        let source = anyhow::anyhow!("disk full").context("writing report");
        let err = ShellError::HandlerFailed {
            name: "report".to_string(),
            source,
        };
        assert_eq!(err.to_string(), "command `report` failed: writing report: disk full");
        assert_eq!(err.command(), Some("report"));
    }

    #[test]
    fn test_timed_out_message() {
        let err = ShellError::HandlerTimedOut {
            name: "slow".to_string(),
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "command `slow` timed out after 1.5s");
    }
}
