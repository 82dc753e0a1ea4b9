//! Command discovery.
//!
//! Commands are grouped into [`Namespace`]s, a static stand-in for a directory
//! of command modules: each entry is either a module (a constructor for one
//! command) or a nested namespace (a listing that may itself fail). The
//! [`Loader`] walks namespaces in entry order and registers what it finds.
//!
//! Walk order relative to name collisions is unspecified. Because the registry
//! lets the last registration win, two modules that claim the same key are
//! resolved by load order; the loader reports such overwrites but does not
//! prevent them.
//!
//! Loading is partial-failure tolerant: a module whose constructor fails, or a
//! nested namespace whose listing fails, is logged and skipped while its
//! siblings still load.

use crate::command::Command;
use crate::registry::Registry;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Registries of enabled extensions, keyed by extension name.
pub type Extensions = HashMap<String, Arc<Registry>>;

type ModuleFn = Box<dyn FnOnce() -> Result<Arc<dyn Command>> + Send>;
type ListingFn = Box<dyn FnOnce() -> Result<Namespace> + Send>;

enum Entry {
    Module { name: String, load: ModuleFn },
    Nested { name: String, list: ListingFn },
}

/// A named group of command modules.
pub struct Namespace {
    name: String,
    entries: Vec<Entry>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a module whose constructor may fail.
    pub fn module<F>(mut self, name: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn Command>> + Send + 'static,
    {
        self.entries.push(Entry::Module {
            name: name.into(),
            load: Box::new(load),
        });
        self
    }

    /// Add a module that always yields `command`.
    pub fn command<C: Command + 'static>(self, command: C) -> Self {
        let name = command.name().to_string();
        self.module(name, move || Ok(Arc::new(command) as Arc<dyn Command>))
    }

    /// Add a nested namespace produced by a listing that may fail.
    pub fn nested<F>(mut self, name: impl Into<String>, list: F) -> Self
    where
        F: FnOnce() -> Result<Namespace> + Send + 'static,
    {
        self.entries.push(Entry::Nested {
            name: name.into(),
            list: Box::new(list),
        });
        self
    }

    /// Add an already-built nested namespace.
    pub fn directory(self, namespace: Namespace) -> Self {
        let name = namespace.name.clone();
        self.nested(name, move || Ok(namespace))
    }
}

/// A secondary command set reachable only through a forwarding command.
///
/// A missing namespace means the extension is unavailable and is treated the
/// same as a disabled one.
pub struct Extension {
    pub name: String,
    pub enabled: bool,
    pub namespace: Option<Namespace>,
}

impl Extension {
    pub fn new(name: impl Into<String>, enabled: bool, namespace: Option<Namespace>) -> Self {
        Self {
            name: name.into(),
            enabled,
            namespace,
        }
    }
}

/// What a load pass did, by module path (`namespace/module`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of commands registered.
    pub registered: usize,
    /// Modules skipped because their command had no name.
    pub skipped: Vec<String>,
    /// Modules or namespaces that failed to load.
    pub failed: Vec<String>,
    /// Keys whose earlier binding was replaced by a later module.
    pub overwritten: Vec<String>,
}

#[derive(Default)]
pub struct Loader {
    report: LoadReport,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively register every command found in `namespace`.
    pub fn load(&mut self, namespace: Namespace, registry: &mut Registry) {
        self.walk(namespace, "", registry);
    }

    fn walk(&mut self, namespace: Namespace, parent: &str, registry: &mut Registry) {
        let prefix = join(parent, &namespace.name);
        for entry in namespace.entries {
            match entry {
                Entry::Module { name, load } => {
                    let path = join(&prefix, &name);
                    self.register_module(path, load, registry);
                }
                Entry::Nested { name, list } => {
                    let path = join(&prefix, &name);
                    match list() {
                        Ok(nested) => self.walk(nested, &prefix, registry),
                        Err(err) => {
                            tracing::warn!(namespace = %path, error = %format!("{err:#}"), "failed to list namespace");
                            self.report.failed.push(path);
                        }
                    }
                }
            }
        }
    }

    fn register_module(&mut self, path: String, load: ModuleFn, registry: &mut Registry) {
        let command = match load() {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(module = %path, error = %format!("{err:#}"), "failed to load command module");
                self.report.failed.push(path);
                return;
            }
        };
        if command.name().trim().is_empty() {
            tracing::debug!(module = %path, "skipping module without a command name");
            self.report.skipped.push(path);
            return;
        }
        let overwritten = registry.register(Arc::clone(&command));
        for key in &overwritten {
            tracing::warn!(module = %path, key = %key, "command key already bound, replacing it");
        }
        tracing::debug!(module = %path, command = command.name(), "registered command");
        self.report.overwritten.extend(overwritten);
        self.report.registered += 1;
    }

    /// Load each enabled extension into its own registry.
    pub fn load_extensions(&mut self, extensions: Vec<Extension>) -> Extensions {
        let mut loaded = Extensions::new();
        for extension in extensions {
            if !extension.enabled {
                tracing::info!(extension = %extension.name, "extension disabled");
                continue;
            }
            let Some(namespace) = extension.namespace else {
                tracing::info!(extension = %extension.name, "extension commands unavailable, treating as disabled");
                continue;
            };
            let mut registry = Registry::new();
            self.load(namespace, &mut registry);
            loaded.insert(extension.name, Arc::new(registry));
        }
        loaded
    }

    pub fn finish(self) -> LoadReport {
        self.report
    }
}

/// Everything the interpreter needs from a load pass.
pub struct Catalog {
    pub commands: Registry,
    pub extensions: Extensions,
    pub report: LoadReport,
}

/// Load the main namespace and all extensions.
pub fn load_catalog(main: Namespace, extensions: Vec<Extension>) -> Catalog {
    let mut loader = Loader::new();
    let mut commands = Registry::new();
    loader.load(main, &mut commands);
    let extensions = loader.load_extensions(extensions);
    let report = loader.finish();
    tracing::info!(
        registered = report.registered,
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        extensions = extensions.len(),
        "commands loaded"
    );
    Catalog {
        commands,
        extensions,
        report,
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::stub;
    use anyhow::anyhow;

    #[test]
    fn test_loads_nested_namespaces() {
        let main = Namespace::new("commands")
            .module("exit", || Ok(stub("exit", &["quit"])))
            .directory(Namespace::new("tools").module("help", || Ok(stub("help", &[]))));
        let catalog = load_catalog(main, vec![]);

        assert!(catalog.commands.contains("exit"));
        assert!(catalog.commands.contains("quit"));
        assert!(catalog.commands.contains("help"));
        assert_eq!(catalog.report.registered, 2);
    }

    #[test]
    fn test_malformed_module_is_skipped() {
        let main = Namespace::new("commands")
            .module("broken", || Ok(stub("", &["orphan"])))
            .module("ok", || Ok(stub("ok", &[])));
        let catalog = load_catalog(main, vec![]);

        assert!(!catalog.commands.contains("orphan"));
        assert!(catalog.commands.contains("ok"));
        assert_eq!(catalog.report.skipped, vec!["commands/broken".to_string()]);
        assert!(catalog.report.failed.is_empty());
    }

    #[test]
    fn test_failures_do_not_abort_siblings() {
        let main = Namespace::new("commands")
            .module("bad", || Err(anyhow!("constructor exploded")))
            .nested("unreadable", || Err(anyhow!("permission denied")))
            .module("good", || Ok(stub("good", &[])));
        let catalog = load_catalog(main, vec![]);

        assert!(catalog.commands.contains("good"));
        assert_eq!(
            catalog.report.failed,
            vec!["commands/bad".to_string(), "commands/unreadable".to_string()]
        );
    }

    #[test]
    fn test_later_module_wins_and_is_reported() {
        let main = Namespace::new("commands")
            .module("first", || Ok(stub("first", &["z"])))
            .module("second", || Ok(stub("second", &["z"])));
        let catalog = load_catalog(main, vec![]);

        assert_eq!(catalog.commands.lookup("z").unwrap().name(), "second");
        assert_eq!(catalog.report.overwritten, vec!["z".to_string()]);
    }

    #[test]
    fn test_extensions_get_their_own_registry() {
        let main = Namespace::new("commands").module("discord", || Ok(stub("discord", &["ds"])));
        let discord = Namespace::new("discord").module("send", || Ok(stub("send", &[])));
        let catalog = load_catalog(main, vec![Extension::new("discord", true, Some(discord))]);

        assert!(!catalog.commands.contains("send"));
        let ext = catalog.extensions.get("discord").unwrap();
        assert!(ext.contains("send"));
        assert!(!ext.contains("discord"));
    }

    #[test]
    fn test_disabled_or_absent_extension_is_not_loaded() {
        let loaded = Namespace::new("discord").module("send", || Ok(stub("send", &[])));
        let catalog = load_catalog(
            Namespace::new("commands"),
            vec![
                Extension::new("discord", false, Some(loaded)),
                Extension::new("telegram", true, None),
            ],
        );

        assert!(catalog.extensions.is_empty());
        assert!(catalog.report.failed.is_empty());
    }
}
