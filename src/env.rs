use std::collections::HashMap;
use std::env as stdenv;

/// Snapshot of the process environment the shell configures itself from.
///
/// Taking a snapshot keeps configuration reads deterministic and lets tests
/// build an environment without touching the real process variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process variables.
    pub fn capture() -> Self {
        Self {
            vars: stdenv::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs only.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}
