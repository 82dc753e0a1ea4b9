use crate::command::Command;
use std::collections::HashMap;
use std::sync::Arc;

/// Name and alias lookup table for commands.
///
/// Every key maps to exactly one command. Registering a command under a key
/// that is already bound replaces the previous binding: the last registration
/// wins. The replaced keys are returned so the caller can report them.
#[derive(Default, Clone)]
pub struct Registry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `command` under its name and each of its aliases.
    ///
    /// Returns the keys whose previous binding pointed at a different command.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Vec<String> {
        let keys = std::iter::once(command.name()).chain(command.aliases().iter().copied());
        let mut overwritten = Vec::new();
        for key in keys.map(str::to_string).collect::<Vec<_>>() {
            if let Some(previous) = self.commands.insert(key.clone(), Arc::clone(&command)) {
                if !Arc::ptr_eq(&previous, &command) {
                    overwritten.push(key);
                }
            }
        }
        overwritten
    }

    pub fn lookup(&self, key: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(key)
    }

    /// Unbind a single key. Other keys of the same command stay bound.
    pub fn remove(&mut self, key: &str) -> Option<Arc<dyn Command>> {
        self.commands.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.commands.contains_key(key)
    }

    /// Number of bound keys, aliases included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All bound keys in alphabetical order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Distinct commands reachable through this registry, ordered by name.
    pub fn commands(&self) -> Vec<Arc<dyn Command>> {
        let mut distinct: Vec<Arc<dyn Command>> = Vec::new();
        for command in self.commands.values() {
            if !distinct.iter().any(|c| Arc::ptr_eq(c, command)) {
                distinct.push(Arc::clone(command));
            }
        }
        distinct.sort_by(|a, b| a.name().cmp(b.name()));
        distinct
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("keys", &self.keys()).finish()
    }
}
