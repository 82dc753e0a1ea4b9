use super::Guild;
use crate::command::{Command, Flags};
use crate::context::ShellContext;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::io::Write;

const COUNT_WORDS: [&str; 3] = ["count", "number", "#"];

/// `discord get servers|guilds <name|id|invite|count|members count>`
pub struct GetCommand;

#[async_trait]
impl Command for GetCommand {
    fn name(&self) -> &str {
        "get"
    }

    fn summary(&self) -> &str {
        "list the servers the bot is in"
    }

    async fn execute(&self, parameters: &[String], flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        let Some(client) = ctx.discord().cloned() else {
            writeln!(ctx.out(), "Discord client unavailable.")?;
            return Ok(());
        };
        if !matches!(parameters.first().map(String::as_str), Some("servers" | "guilds")) {
            writeln!(ctx.out(), "Invalid command. Please check the manual on how to use the \"get\" command.")?;
            writeln!(ctx.out(), "help discord get")?;
            return Ok(());
        }

        let guilds = client.guilds().await?;
        let has = |word: &str| parameters.iter().any(|p| p == word);
        let second = parameters.get(1).map(String::as_str);

        if has("name") && has("id") {
            let lines = guilds.iter().map(|g| format!("{} ({})", g.name, g.id)).collect();
            print_list(ctx, lines, flags)?;
        } else if second == Some("invite") {
            let invites = join_all(guilds.iter().map(|g| client.invites(&g.id))).await;
            let lines = guilds
                .iter()
                .zip(invites)
                .map(|(guild, codes)| invite_line(guild, codes.unwrap_or_default()))
                .collect();
            print_list(ctx, lines, flags)?;
        } else if second == Some("name") {
            let lines = guilds.iter().map(|g| g.name.clone()).collect();
            print_list(ctx, lines, flags)?;
        } else if has("members") && COUNT_WORDS.iter().any(|&w| has(w)) {
            writeln!(ctx.out(), "Counting members...")?;
            let counts = join_all(guilds.iter().map(|g| client.member_count(&g.id))).await;
            let mut members = 0;
            for count in counts {
                members += count?;
            }
            writeln!(ctx.out(), "There are {members} users across all the servers using Demido.")?;
        } else if second.is_some_and(|w| COUNT_WORDS.contains(&w)) {
            if flags.has("number_only") {
                writeln!(ctx.out(), "{}", guilds.len())?;
            } else {
                writeln!(ctx.out(), "Demido is part of {} Discord servers.", guilds.len())?;
            }
        } else {
            writeln!(
                ctx.out(),
                "Invalid command. Please check the manual on how to use the \"get servers|guilds\" command."
            )?;
            writeln!(ctx.out(), "help discord get servers or help discord get guilds")?;
        }
        Ok(())
    }
}

fn invite_line(guild: &Guild, codes: Vec<String>) -> String {
    if codes.is_empty() {
        format!("{} -> (No invites)", guild.name)
    } else {
        format!("{} -> ({})", guild.name, codes.join(", "))
    }
}

/// Print one entry per line, or as a list with `--as-array`, or comma-joined
/// with `--as-string`.
fn print_list(ctx: &mut ShellContext, lines: Vec<String>, flags: &Flags) -> Result<()> {
    if flags.has("as_array") {
        writeln!(ctx.out(), "{lines:?}")?;
    } else if flags.has("as_string") {
        writeln!(ctx.out(), "{}", lines.join(", "))?;
    } else {
        for line in lines {
            writeln!(ctx.out(), "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Services;
    use crate::context::tests::test_context;
    use crate::discord::DiscordClient;
    use crate::discord::fake::FakeClient;
    use crate::parser::parse_line;
    use std::sync::Arc;

    fn client() -> FakeClient {
        FakeClient {
            invites: vec![("1".to_string(), vec!["abc".to_string(), "def".to_string()])],
            members: 10,
            ..FakeClient::with_guilds(&[("1", "Alpha"), ("2", "Beta")])
        }
    }

    async fn get(line: &str) -> String {
        let services = Services {
            discord: Some(Arc::new(client()) as Arc<dyn DiscordClient>),
            updater: None,
        };
        let (mut ctx, out) = test_context(services);
        let inv = parse_line(line).unwrap();
        GetCommand.execute(&inv.parameters, &inv.flags, &mut ctx).await.unwrap();
        out.contents()
    }

    #[tokio::test]
    async fn test_names() {
        assert_eq!(get("get servers name").await, "Alpha\nBeta\n");
        assert_eq!(get("get guilds name --as-string").await, "Alpha, Beta\n");
        assert_eq!(get("get guilds name --as-array").await, "[\"Alpha\", \"Beta\"]\n");
    }

    #[tokio::test]
    async fn test_names_with_ids() {
        assert_eq!(get("get servers id name").await, "Alpha (1)\nBeta (2)\n");
    }

    #[tokio::test]
    async fn test_invites_tolerate_failures() {
        assert_eq!(
            get("get servers invite").await,
            "Alpha -> (abc, def)\nBeta -> (No invites)\n"
        );
    }

    #[tokio::test]
    async fn test_counts() {
        assert_eq!(get("get servers count").await, "Demido is part of 2 Discord servers.\n");
        assert_eq!(get("get servers # --number-only").await, "2\n");
        assert_eq!(
            get("get servers members count").await,
            "Counting members...\nThere are 20 users across all the servers using Demido.\n"
        );
    }

    #[tokio::test]
    async fn test_invalid_usage() {
        assert!(get("get channels").await.starts_with("Invalid command."));
        assert!(get("get servers everything").await.contains("\"get servers|guilds\""));
    }
}
