use crate::command::{Command, Flags};
use crate::context::ShellContext;
use crate::discord::{self, Discord};
use crate::loader::Namespace;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use async_trait::async_trait;
use std::io::Write;
use std::marker::PhantomData;

/// Built-in commands known to the shell at compile time.
///
/// Builtins parse their parameters with the [`argh`] crate (`FromArgs`), so
/// `--help` and argument errors are handled uniformly. The flag map produced
/// by the shell's own parser is not used.
#[async_trait]
pub(crate) trait BuiltinCommand: Sized + FromArgs + Send {
    /// Canonical name of the command, e.g. "exit" or "help".
    const NAME: &'static str;

    const ALIASES: &'static [&'static str] = &[];

    const SUMMARY: &'static str;

    /// Executes the command with the shell context.
    async fn run(self, ctx: &mut ShellContext) -> Result<()>;
}

/// Adapter registering a [`BuiltinCommand`] as a [`Command`].
pub(crate) struct Builtin<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Builtin<T> {
    pub(crate) fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T: BuiltinCommand + 'static> Command for Builtin<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn aliases(&self) -> &[&str] {
        T::ALIASES
    }

    fn summary(&self) -> &str {
        T::SUMMARY
    }

    async fn execute(&self, parameters: &[String], _flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        let args: Vec<&str> = parameters.iter().map(String::as_str).collect();
        match T::from_args(&[T::NAME], &args) {
            Ok(cmd) => cmd.run(ctx).await,
            Err(EarlyExit { output, status }) => {
                write!(ctx.out(), "{output}")?;
                if !output.ends_with('\n') {
                    writeln!(ctx.out())?;
                }
                if status.is_err() {
                    tracing::debug!(command = T::NAME, "invalid arguments");
                }
                Ok(())
            }
        }
    }
}

/// Stops the shell, disconnecting the Discord bot if it is running.
///
/// Takes no arguments and ignores anything passed to it, flags included, so
/// it is not routed through `argh`.
pub struct Exit;

#[async_trait]
impl Command for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit", "stop"]
    }

    fn summary(&self) -> &str {
        "stop the shell"
    }

    async fn execute(&self, _parameters: &[String], _flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        ctx.stop();
        if let Some(client) = ctx.discord().cloned() {
            if client.is_ready() {
                client.shutdown().await.context("stopping the Discord bot")?;
                tracing::info!("discord client shut down");
            }
        }
        writeln!(ctx.out(), "Goodbye!")?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// List the available commands, or describe one of them.
pub struct Help {
    #[argh(positional)]
    /// command to describe; `help discord` also lists the Discord commands.
    pub topic: Vec<String>,
}

#[async_trait]
impl BuiltinCommand for Help {
    const NAME: &'static str = "help";
    const ALIASES: &'static [&'static str] = &["h", "?"];
    const SUMMARY: &'static str = "list commands";

    async fn run(self, ctx: &mut ShellContext) -> Result<()> {
        let Some(name) = self.topic.first() else {
            let commands = ctx.commands().commands();
            writeln!(ctx.out(), "Available commands:")?;
            for command in commands {
                writeln!(ctx.out(), "  {}", describe(command.as_ref()))?;
            }
            return Ok(());
        };

        let Some(command) = ctx.commands().lookup(name).cloned() else {
            writeln!(ctx.out(), "There is no command named `{name}`.")?;
            return Ok(());
        };
        writeln!(ctx.out(), "{}", describe(command.as_ref()))?;

        if command.name() == discord::EXTENSION {
            let extension = ctx.extension(discord::EXTENSION).map(|r| r.commands());
            match extension {
                Some(commands) => {
                    for sub in commands {
                        writeln!(ctx.out(), "  {}", describe(sub.as_ref()))?;
                    }
                }
                None => writeln!(ctx.out(), "  (the Discord extension is disabled)")?,
            }
        }
        Ok(())
    }
}

fn describe(command: &dyn Command) -> String {
    let mut line = command.name().to_string();
    if !command.aliases().is_empty() {
        line.push_str(&format!(" ({})", command.aliases().join(", ")));
    }
    if !command.summary().is_empty() {
        line.push_str(&format!(" - {}", command.summary()));
    }
    line
}

/// The commands available at the top level of the shell.
pub fn namespace() -> Namespace {
    Namespace::new("commands")
        .command(Exit)
        .command(Builtin::<Help>::new())
        .command(Discord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Services;
    use crate::context::tests::{test_context, test_context_with};
    use crate::discord::DiscordClient;
    use crate::discord::fake::FakeClient;
    use crate::loader::{Extension, load_catalog};
    use std::sync::Arc;

    fn params(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_exit_stops_and_shuts_client_down() {
        let client = Arc::new(FakeClient::default());
        let services = Services {
            discord: Some(client.clone() as Arc<dyn DiscordClient>),
            updater: None,
        };
        let (mut ctx, out) = test_context(services);

        Exit.execute(&params(&["now"]), &Flags::new(), &mut ctx).await.unwrap();

        assert!(!ctx.is_running());
        assert!(client.is_shut_down());
        assert_eq!(out.contents(), "Goodbye!\n");
    }

    #[tokio::test]
    async fn test_exit_without_client() {
        let (mut ctx, out) = test_context(Services::default());
        Exit.execute(&[], &Flags::new(), &mut ctx).await.unwrap();
        assert!(!ctx.is_running());
        assert_eq!(out.contents(), "Goodbye!\n");
    }

    #[tokio::test]
    async fn test_exit_ignores_flags() {
        let (mut ctx, out) = test_context(Services::default());
        let inv = crate::parser::parse_line("exit --now --force yes").unwrap();
        Exit.execute(&inv.parameters, &inv.flags, &mut ctx).await.unwrap();
        assert!(!ctx.is_running());
        assert_eq!(out.contents(), "Goodbye!\n");
    }

    #[tokio::test]
    async fn test_builtin_help_flag_prints_usage() {
        let (mut ctx, out) = test_context(Services::default());
        Builtin::<Help>::new().execute(&params(&["--help"]), &Flags::new(), &mut ctx).await.unwrap();
        assert!(out.contents().contains("Usage: help"));
        assert!(ctx.is_running());
    }

    fn catalog_context(discord_enabled: bool) -> (ShellContext, crate::io_adapters::MemWriter) {
        let catalog = load_catalog(
            namespace(),
            vec![Extension::new(discord::EXTENSION, discord_enabled, Some(discord::namespace()))],
        );
        test_context_with(catalog.commands, catalog.extensions, Services::default())
    }

    #[tokio::test]
    async fn test_help_lists_commands_once_with_aliases() {
        let (mut ctx, out) = catalog_context(true);
        Builtin::<Help>::new().execute(&[], &Flags::new(), &mut ctx).await.unwrap();

        let output = out.contents();
        assert!(output.starts_with("Available commands:\n"));
        assert!(output.contains("  discord (ds) - "));
        assert!(output.contains("  exit (quit, stop) - stop the shell"));
        assert_eq!(output.matches("exit").count(), 1);
    }

    #[tokio::test]
    async fn test_help_for_discord_lists_extension() {
        let (mut ctx, out) = catalog_context(true);
        Builtin::<Help>::new().execute(&params(&["ds"]), &Flags::new(), &mut ctx).await.unwrap();
        let output = out.contents();
        assert!(output.contains("  update (u) - "));
        assert!(output.contains("  send - "));

        let (mut ctx, out) = catalog_context(false);
        Builtin::<Help>::new().execute(&params(&["discord"]), &Flags::new(), &mut ctx).await.unwrap();
        assert!(out.contents().contains("(the Discord extension is disabled)"));
    }

    #[tokio::test]
    async fn test_help_unknown_topic() {
        let (mut ctx, out) = catalog_context(true);
        Builtin::<Help>::new().execute(&params(&["ghost"]), &Flags::new(), &mut ctx).await.unwrap();
        assert_eq!(out.contents(), "There is no command named `ghost`.\n");
    }
}
