//! Discord extension commands.
//!
//! These commands live in their own registry and are reached through the
//! top-level `discord` (`ds`) command, which forwards to them using its first
//! parameter as the sub-command name. They talk to Discord only through the
//! [`DiscordClient`] capability injected into the shell context.

mod get;
mod send;
mod update;

use crate::command::{Command, Flags};
use crate::context::ShellContext;
use crate::loader::Namespace;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;

pub use get::GetCommand;
pub use send::SendCommand;
pub use update::UpdateCommand;

/// Name of the extension registry the forwarder dispatches into.
pub const EXTENSION: &str = "discord";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Whether messages can be posted to this channel.
    pub sendable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: u32,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub url: String,
    pub file_name: Option<String>,
    pub description: Option<String>,
}

/// The operations Discord commands need from a connected bot.
#[async_trait]
pub trait DiscordClient: Send + Sync {
    fn is_ready(&self) -> bool;

    async fn guilds(&self) -> Result<Vec<Guild>>;

    async fn invites(&self, guild_id: &str) -> Result<Vec<String>>;

    async fn member_count(&self, guild_id: &str) -> Result<u64>;

    async fn channel(&self, guild_id: &str, channel_id: &str) -> Result<Option<Channel>>;

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<()>;

    async fn send_image(&self, channel_id: &str, image: &ImageUpload) -> Result<()>;

    /// Disconnect the bot.
    async fn shutdown(&self) -> Result<()>;
}

/// Top-level forwarder into the Discord extension registry.
pub struct Discord;

#[async_trait]
impl Command for Discord {
    fn name(&self) -> &str {
        "discord"
    }

    fn aliases(&self) -> &[&str] {
        &["ds"]
    }

    fn summary(&self) -> &str {
        "run a Discord sub-command (send, get, update)"
    }

    async fn execute(&self, parameters: &[String], flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        let wants_update = matches!(parameters.first().map(String::as_str), Some("update" | "u"));
        if ctx.discord().is_none() && !wants_update {
            writeln!(ctx.out(), "Discord client unavailable.")?;
            return Ok(());
        }
        if parameters.is_empty() {
            let available = ctx
                .extension(EXTENSION)
                .map(|registry| {
                    registry
                        .commands()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            writeln!(ctx.out(), "Usage: discord <command> [parameters] [--flags]")?;
            writeln!(ctx.out(), "Commands: {available}")?;
            return Ok(());
        }
        ctx.forward(EXTENSION, parameters, flags).await
    }
}

/// The commands of the Discord extension.
pub fn namespace() -> Namespace {
    Namespace::new(EXTENSION)
        .command(SendCommand)
        .command(GetCommand)
        .command(UpdateCommand)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeClient;
    use super::*;
    use crate::context::Services;
    use crate::context::tests::test_context_with;
    use crate::registry::Registry;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn extension_context(client: Option<FakeClient>) -> (ShellContext, crate::io_adapters::MemWriter) {
        let mut registry = Registry::new();
        let mut loader = crate::loader::Loader::new();
        loader.load(namespace(), &mut registry);
        let mut extensions = HashMap::new();
        extensions.insert(EXTENSION.to_string(), Arc::new(registry));
        let services = Services {
            discord: client.map(|c| Arc::new(c) as Arc<dyn DiscordClient>),
            updater: None,
        };
        test_context_with(Registry::new(), extensions, services)
    }

    fn params(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_without_client_only_update_is_forwarded() {
        let (mut ctx, out) = extension_context(None);
        Discord.execute(&params(&["get", "servers"]), &Flags::new(), &mut ctx).await.unwrap();
        assert_eq!(out.contents(), "Discord client unavailable.\n");

        Discord.execute(&params(&["update"]), &Flags::new(), &mut ctx).await.unwrap();
        assert!(out.contents().contains("Updater unavailable."));
    }

    #[tokio::test]
    async fn test_usage_lists_extension_commands() {
        let (mut ctx, out) = extension_context(Some(FakeClient::default()));
        Discord.execute(&[], &Flags::new(), &mut ctx).await.unwrap();
        assert!(out.contents().contains("Commands: get, send, update"));
    }

    #[tokio::test]
    async fn test_forwards_with_first_parameter_removed() {
        let (mut ctx, out) = extension_context(Some(FakeClient::with_guilds(&[("1", "Alpha")])));
        Discord.execute(&params(&["get", "guilds", "name"]), &Flags::new(), &mut ctx).await.unwrap();
        assert_eq!(out.contents(), "Alpha\n");
    }
}
