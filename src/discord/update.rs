use crate::command::{Command, Flags};
use crate::context::ShellContext;
use crate::updater::UpdateStatus;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;

/// `discord update [--check]`: refresh the bot checkout from its remote.
///
/// Available even when no Discord client is connected, since a missing or
/// outdated bot is exactly when an update is needed.
pub struct UpdateCommand;

#[async_trait]
impl Command for UpdateCommand {
    fn name(&self) -> &str {
        "update"
    }

    fn aliases(&self) -> &[&str] {
        &["u"]
    }

    fn summary(&self) -> &str {
        "pull the latest bot version (--check to only look)"
    }

    async fn execute(&self, _parameters: &[String], flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        let Some(updater) = ctx.updater().cloned() else {
            writeln!(ctx.out(), "Updater unavailable.")?;
            return Ok(());
        };

        let status = updater.check_remote().await.context("checking for updates")?;
        match status {
            UpdateStatus::UpToDate => writeln!(ctx.out(), "Already up to date.")?,
            UpdateStatus::Stale { behind } if flags.has("check") => {
                writeln!(ctx.out(), "{behind} new commit(s) available.")?;
            }
            UpdateStatus::Stale { behind } => {
                writeln!(ctx.out(), "Pulling {behind} new commit(s)...")?;
                updater.pull().await.context("pulling updates")?;
                tracing::info!(commits = behind, "updated from remote");
                writeln!(ctx.out(), "Updated. Restart the shell to use the new version.")?;
            }
        }
        Ok(())
    }
}
