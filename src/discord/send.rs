use super::{Channel, Embed, EmbedAuthor, Guild, ImageUpload};
use crate::command::{Command, Flags};
use crate::context::ShellContext;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::io::Write;
use std::sync::LazyLock;

const DEFAULT_COLOR: u32 = 0x57f287;
const MAX_COLOR: u32 = 0xffffff;
const DEFAULT_AUTHOR_ICON: &str =
    "https://www.iprcenter.gov/image-repository/blank-profile-picture.png/@@images/image.png";

/// Words that mean "leave this embed field out".
const UNSET: [&str; 5] = ["none", "null", "nothing", "empty", "undefined"];

static MEDIA_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"media\d+").expect("media host pattern is valid"));

/// `discord send message|embed|image ... --guild-id <id> --channel-id <id>`
pub struct SendCommand;

#[async_trait]
impl Command for SendCommand {
    fn name(&self) -> &str {
        "send"
    }

    fn summary(&self) -> &str {
        "post a message, embed or image to a channel"
    }

    async fn execute(&self, parameters: &[String], flags: &Flags, ctx: &mut ShellContext) -> Result<()> {
        let Some(client) = ctx.discord().cloned() else {
            writeln!(ctx.out(), "Discord client unavailable.")?;
            return Ok(());
        };
        let Some(kind) = parameters.first() else {
            writeln!(ctx.out(), "Insufficient parameters provided. Check the manual for \"discord send\".")?;
            return Ok(());
        };

        let guild_id = flags.first_value(&["guild_id", "server_id"]).unwrap_or_default();
        let channel_id = flags.first_value(&["channel_id", "chat_id"]).unwrap_or_default();

        let guild = client.guilds().await?.into_iter().find(|g| g.id == guild_id);
        let Some(guild) = guild else {
            writeln!(ctx.out(), "Guild not found for ID: {guild_id}.")?;
            return Ok(());
        };
        let channel = match client.channel(&guild.id, channel_id).await? {
            Some(channel) if channel.sendable => channel,
            _ => {
                writeln!(ctx.out(), "Channel not found or unsupported: {channel_id}.")?;
                return Ok(());
            }
        };
        let arg = |i: usize| parameters.get(i).map(String::as_str).unwrap_or_default();

        match kind.as_str() {
            "message" | "msg" => {
                client.send_message(&channel.id, arg(1)).await?;
                writeln!(ctx.out(), "Message sent to {}.", target(&channel, &guild))?;
            }
            "embed" => {
                let embed = build_embed(arg(1), arg(2), flags);
                client.send_embed(&channel.id, &embed).await?;
                writeln!(ctx.out(), "Embed sent to {}.", target(&channel, &guild))?;
            }
            "image" | "img" | "photo" | "picture" => {
                let upload = ImageUpload {
                    url: normalize_media_url(arg(1)),
                    file_name: flags.value("file_name").map(str::to_string),
                    description: flags.value("file_description").map(str::to_string),
                };
                writeln!(ctx.out(), "Sending image...")?;
                match client.send_image(&channel.id, &upload).await {
                    Ok(()) => writeln!(ctx.out(), "File sent to {}.", target(&channel, &guild))?,
                    Err(err) => {
                        tracing::warn!(url = %upload.url, error = %format!("{err:#}"), "image upload rejected");
                        writeln!(
                            ctx.out(),
                            "Only image files are allowed.\n{} is not an image.",
                            upload.url
                        )?;
                    }
                }
            }
            other => {
                writeln!(
                    ctx.out(),
                    "Invalid command: {other}. Expected \"message\", \"embed\" or \"image\"."
                )?;
            }
        }
        Ok(())
    }
}

fn target(channel: &Channel, guild: &Guild) -> String {
    format!("{} ({}) in {} ({})", channel.name, channel.id, guild.name, guild.id)
}

fn field(value: &str) -> Option<String> {
    (!value.is_empty() && !UNSET.contains(&value)).then(|| value.to_string())
}

fn build_embed(title: &str, description: &str, flags: &Flags) -> Embed {
    let color = flags
        .value("color")
        .and_then(parse_color)
        .filter(|c| *c != 0)
        .unwrap_or(DEFAULT_COLOR);
    let author = flags.value("author").map(|name| EmbedAuthor {
        name: name.to_string(),
        icon_url: (!flags.has("disable_author_icon")).then(|| {
            flags
                .value("author_icon")
                .unwrap_or(DEFAULT_AUTHOR_ICON)
                .to_string()
        }),
    });
    let text = |key: &str| flags.value(key).map(str::to_string);
    Embed {
        title: field(title),
        description: field(description),
        color,
        author,
        footer: text("footer"),
        thumbnail: text("thumbnail"),
        image: text("image"),
        url: text("url"),
    }
}

/// Read a hex color from the longest run of hex digits at the start, after
/// dropping the first `#` and an optional `0x`. `ff00zz` is `0xff00`.
fn parse_color(value: &str) -> Option<u32> {
    let value = value.replacen('#', "", 1);
    let value = value.trim_start();
    let value = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(value.len());
    u32::from_str_radix(&value[..end], 16)
        .ok()
        .filter(|c| *c <= MAX_COLOR)
}

/// Rewrite media-proxy links (`mediaN.` hosts, `/m/` paths) to their direct form.
fn normalize_media_url(url: &str) -> String {
    let url = url.replacen("/m/", "/", 1);
    MEDIA_HOST.replace_all(&url, "media").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Services;
    use crate::context::tests::test_context;
    use crate::discord::DiscordClient;
    use crate::discord::fake::{FakeClient, Sent};
    use crate::parser::parse_line;
    use std::sync::Arc;

    async fn send(line: &str, client: Arc<FakeClient>) -> String {
        let services = Services {
            discord: Some(client as Arc<dyn DiscordClient>),
            updater: None,
        };
        let (mut ctx, out) = test_context(services);
        let inv = parse_line(line).unwrap();
        SendCommand.execute(&inv.parameters, &inv.flags, &mut ctx).await.unwrap();
        out.contents()
    }

    fn client() -> Arc<FakeClient> {
        Arc::new(FakeClient::with_guilds(&[("42", "Demido")]))
    }

    #[tokio::test]
    async fn test_send_message() {
        let client = client();
        let out = send(r#"send msg "hello there" --guild-id 42 --channel-id 42-general"#, client.clone()).await;

        assert_eq!(out, "Message sent to general (42-general) in Demido (42).\n");
        assert_eq!(
            client.sent(),
            vec![Sent::Message {
                channel: "42-general".to_string(),
                text: "hello there".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_server_and_chat_aliases() {
        let client = client();
        let out = send("send message hi --server-id 42 --chat-id 42-general", client.clone()).await;
        assert!(out.starts_with("Message sent"));
    }

    #[tokio::test]
    async fn test_unknown_guild_and_channel() {
        let out = send("send msg hi --guild-id 7 --channel-id x", client()).await;
        assert_eq!(out, "Guild not found for ID: 7.\n");

        let out = send("send msg hi --guild-id 42 --channel-id x", client()).await;
        assert_eq!(out, "Channel not found or unsupported: x.\n");
    }

    #[tokio::test]
    async fn test_send_embed_fields() {
        let client = client();
        send(
            r##"send embed none "Body text" --guild-id 42 --channel-id 42-general --color "#ff0000" --author Demido --footer bye"##,
            client.clone(),
        )
        .await;

        let sent = client.sent();
        let Sent::Embed { embed, .. } = &sent[0] else {
            panic!("expected an embed, got {sent:?}");
        };
        assert_eq!(embed.title, None);
        assert_eq!(embed.description.as_deref(), Some("Body text"));
        assert_eq!(embed.color, 0xff0000);
        assert_eq!(
            embed.author,
            Some(EmbedAuthor {
                name: "Demido".to_string(),
                icon_url: Some(DEFAULT_AUTHOR_ICON.to_string())
            })
        );
        assert_eq!(embed.footer.as_deref(), Some("bye"));
    }

    #[test]
    fn test_embed_defaults_and_disabled_icon() {
        let flags = crate::parser::parse_flags(&[
            "--color".to_string(),
            "zzz".to_string(),
            "--author".to_string(),
            "me".to_string(),
            "--disable-author-icon".to_string(),
        ]);
        let embed = build_embed("Title", "", &flags);
        assert_eq!(embed.title.as_deref(), Some("Title"));
        assert_eq!(embed.description, None);
        assert_eq!(embed.color, DEFAULT_COLOR);
        assert_eq!(embed.author.unwrap().icon_url, None);
    }

    #[test]
    fn test_color_uses_leading_hex_digits() {
        assert_eq!(parse_color("#ff0000"), Some(0xff0000));
        assert_eq!(parse_color("ff00zz"), Some(0xff00));
        assert_eq!(parse_color(" 0x1a"), Some(0x1a));
        assert_eq!(parse_color("zz"), None);
        assert_eq!(parse_color("fffffffff"), None);
    }

    #[tokio::test]
    async fn test_send_image_normalizes_url() {
        let client = client();
        send(
            "send img https://media12.example.com/m/cat.png --guild-id 42 --channel-id 42-general --file-name cat",
            client.clone(),
        )
        .await;

        assert_eq!(
            client.sent(),
            vec![Sent::Image {
                channel: "42-general".to_string(),
                image: ImageUpload {
                    url: "https://media.example.com/cat.png".to_string(),
                    file_name: Some("cat".to_string()),
                    description: None,
                }
            }]
        );
    }

    #[tokio::test]
    async fn test_rejected_image_is_reported() {
        let client = Arc::new(FakeClient {
            reject_images: true,
            ..FakeClient::with_guilds(&[("42", "Demido")])
        });
        let out = send("send image https://x.test/a.html --guild-id 42 --channel-id 42-general", client).await;
        assert!(out.contains("https://x.test/a.html is not an image."));
    }

    #[tokio::test]
    async fn test_missing_kind() {
        let out = send("send", client()).await;
        assert!(out.starts_with("Insufficient parameters provided."));
    }
}
