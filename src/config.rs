//! Shell configuration read from the environment.
//!
//! | Variable                     | Meaning                                   | Default          |
//! |------------------------------|-------------------------------------------|------------------|
//! | `CLI_PREFIX`                 | prompt printed before every read          | `[DEMIDO] -> `   |
//! | `DISCORD_BOT`                | load the Discord extension commands       | `true`           |
//! | `SHELL_HANDLER_TIMEOUT_SECS` | cancel handlers running longer than this  | unset (no limit) |
//! | `SHELL_REPO_DIR`             | checkout the `update` command refreshes   | current dir      |
//!
//! Loading never fails: a bad value falls back to its default and is returned
//! as a [`ConfigError`] so the caller can report it.

use crate::env::Environment;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const PROMPT_VAR: &str = "CLI_PREFIX";
pub const DISCORD_VAR: &str = "DISCORD_BOT";
pub const TIMEOUT_VAR: &str = "SHELL_HANDLER_TIMEOUT_SECS";
pub const REPO_DIR_VAR: &str = "SHELL_REPO_DIR";

pub const DEFAULT_PROMPT: &str = "[DEMIDO] -> ";

/// A problem with one configuration variable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration value for {key} is missing.")]
    Missing { key: String },

    #[error("Configuration value for {key} cannot be an empty string.")]
    Empty { key: String },

    #[error("Configuration value for {key} is invalid: `{value}` is not a boolean.")]
    InvalidBoolean { key: String, value: String },

    #[error("Configuration value for {key} is invalid: `{value}` is not a positive number.")]
    InvalidNumber { key: String, value: String },
}

impl ConfigError {
    pub fn key(&self) -> &str {
        match self {
            ConfigError::Missing { key }
            | ConfigError::Empty { key }
            | ConfigError::InvalidBoolean { key, .. }
            | ConfigError::InvalidNumber { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub discord_enabled: bool,
    pub handler_timeout: Option<Duration>,
    pub repo_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            discord_enabled: true,
            handler_timeout: None,
            repo_dir: None,
        }
    }
}

impl ShellConfig {
    /// Read the configuration, collecting every problem found on the way.
    pub fn load(env: &Environment) -> (Self, Vec<ConfigError>) {
        let mut issues = Vec::new();
        let mut config = Self::default();

        match env.get_var(PROMPT_VAR) {
            None => issues.push(ConfigError::Missing {
                key: PROMPT_VAR.to_string(),
            }),
            Some(prompt) if prompt.trim().is_empty() => issues.push(ConfigError::Empty {
                key: PROMPT_VAR.to_string(),
            }),
            Some(prompt) => config.prompt = prompt.to_string(),
        }

        match env.get_var(DISCORD_VAR) {
            None => issues.push(ConfigError::Missing {
                key: DISCORD_VAR.to_string(),
            }),
            Some(value) => match parse_bool(value) {
                Some(enabled) => config.discord_enabled = enabled,
                None => issues.push(ConfigError::InvalidBoolean {
                    key: DISCORD_VAR.to_string(),
                    value: value.to_string(),
                }),
            },
        }

        if let Some(value) = env.get_var(TIMEOUT_VAR) {
            match parse_timeout(value) {
                Some(timeout) => config.handler_timeout = Some(timeout),
                None => issues.push(ConfigError::InvalidNumber {
                    key: TIMEOUT_VAR.to_string(),
                    value: value.to_string(),
                }),
            }
        }

        if let Some(dir) = env.get_var(REPO_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.repo_dir = Some(PathBuf::from(dir));
        }

        (config, issues)
    }
}

/// Parse a positive number of seconds. Values too large for a [`Duration`]
/// are rejected like any other invalid number.
pub fn parse_timeout(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Accepts `true/false`, `1/0`, `yes/no` and `y/n`, in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
