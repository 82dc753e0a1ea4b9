use crate::context::ShellContext;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Flags parsed from an input line, keyed by normalized flag name.
///
/// A `None` value marks a presence-only flag (`--verbose`), `Some` carries the
/// token that followed the flag (`--guild-id 42`). Keys have their `--` prefix
/// stripped and `-` replaced with `_`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(HashMap<String, Option<String>>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a flag. A later flag with the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// True when the flag appeared on the line, with or without a value.
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The flag's value, if the flag appeared and carried one.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// The first value found among `keys`, e.g. `["guild_id", "server_id"]`.
    pub fn first_value(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.value(k))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Flags {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Object-safe trait for anything the shell can dispatch to.
///
/// Commands are registered under their [`name`](Command::name) and every
/// [`alias`](Command::aliases). The handler receives the full parameter list
/// after the command name (flags included) together with the parsed flag map,
/// and may suspend freely: the interpreter awaits it before prompting again.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary lookup key. An empty name marks the command as malformed and the
    /// loader skips it.
    fn name(&self) -> &str;

    /// Additional lookup keys, bound in order after the name.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// One line shown by `help`.
    fn summary(&self) -> &str {
        ""
    }

    /// Run the command.
    async fn execute(
        &self,
        parameters: &[String],
        flags: &Flags,
        ctx: &mut ShellContext,
    ) -> Result<()>;
}
