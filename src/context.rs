//! State shared with every command handler.

use crate::command::Flags;
use crate::discord::DiscordClient;
use crate::loader::Extensions;
use crate::registry::Registry;
use crate::updater::Updater;
use anyhow::{Result, bail};
use std::io::Write;
use std::sync::Arc;

/// Capabilities injected into the shell at start-up.
///
/// Each handle is optional; commands that need a missing capability report it
/// to the user instead of failing the session.
#[derive(Default, Clone)]
pub struct Services {
    pub discord: Option<Arc<dyn DiscordClient>>,
    pub updater: Option<Arc<dyn Updater>>,
}

/// The context passed to [`Command::execute`](crate::command::Command::execute).
///
/// Handlers write user-facing output through [`out`](ShellContext::out), can
/// stop the shell, and can read (never modify) the loaded registries.
pub struct ShellContext {
    out: Box<dyn Write + Send>,
    running: bool,
    commands: Arc<Registry>,
    extensions: Arc<Extensions>,
    services: Services,
}

impl ShellContext {
    pub fn new(
        out: Box<dyn Write + Send>,
        commands: Arc<Registry>,
        extensions: Arc<Extensions>,
        services: Services,
    ) -> Self {
        Self {
            out,
            running: true,
            commands,
            extensions,
            services,
        }
    }

    /// Output stream for user-facing messages.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    pub(crate) fn set_output(&mut self, out: Box<dyn Write + Send>) {
        self.out = out;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the shell to stop. The interpreter performs no further reads once
    /// the current handler returns.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// The main command registry.
    pub fn commands(&self) -> &Registry {
        &self.commands
    }

    /// The registry of a loaded extension, if it is enabled.
    pub fn extension(&self, name: &str) -> Option<&Arc<Registry>> {
        self.extensions.get(name)
    }

    pub fn discord(&self) -> Option<&Arc<dyn DiscordClient>> {
        self.services.discord.as_ref()
    }

    pub fn updater(&self) -> Option<&Arc<dyn Updater>> {
        self.services.updater.as_ref()
    }

    /// Dispatch into an extension registry, using the first parameter as the
    /// sub-command name and passing the rest through.
    ///
    /// A disabled extension or an unknown sub-command is reported on the
    /// output; only the sub-command's own failure is returned as an error.
    pub async fn forward(&mut self, extension: &str, parameters: &[String], flags: &Flags) -> Result<()> {
        let Some(registry) = self.extension(extension).cloned() else {
            writeln!(self.out(), "The `{extension}` extension is not enabled.")?;
            return Ok(());
        };
        let Some((sub, rest)) = parameters.split_first() else {
            bail!("no sub-command given for `{extension}`");
        };
        match registry.lookup(sub).cloned() {
            Some(command) => {
                tracing::debug!(extension, command = %sub, "forwarding to extension command");
                command.execute(rest, flags, self).await
            }
            None => {
                writeln!(self.out(), "There is no `{extension}` command named `{sub}`.")?;
                Ok(())
            }
        }
    }
}
