use anyhow::{Context, Result};
use argh::FromArgs;
use demido_shell::config::{ShellConfig, parse_timeout};
use demido_shell::env::Environment;
use demido_shell::loader::{self, Extension};
use demido_shell::updater::{GitUpdater, Updater};
use demido_shell::{Interpreter, Services, TerminalInput, builtin, discord, logging};
use std::sync::Arc;

#[derive(FromArgs)]
/// Interactive shell for the Demido Discord bot.
struct Options {
    /// prompt printed before each line (overrides CLI_PREFIX)
    #[argh(option)]
    prompt: Option<String>,

    /// do not load the Discord extension (overrides DISCORD_BOT)
    #[argh(switch)]
    no_discord: bool,

    /// cancel commands still running after this many seconds
    #[argh(option)]
    timeout: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let options: Options = argh::from_env();

    match logging::init() {
        Ok(()) => {
            logging::install_panic_hook();
            if let Some(dir) = logging::log_directory() {
                println!("Logs are written to {}", dir.display());
            }
        }
        Err(err) => eprintln!("warning: logging disabled: {err:#}"),
    }

    let (mut config, issues) = ShellConfig::load(&Environment::capture());
    for issue in &issues {
        tracing::warn!(key = issue.key(), "{issue}");
        eprintln!("warning: {issue}");
    }
    if let Some(prompt) = options.prompt {
        config.prompt = prompt;
    }
    if options.no_discord {
        config.discord_enabled = false;
    }
    if let Some(value) = options.timeout {
        match parse_timeout(&value) {
            Some(timeout) => config.handler_timeout = Some(timeout),
            None => eprintln!("warning: ignoring --timeout {value}: not a positive number of seconds"),
        }
    }

    let catalog = loader::load_catalog(
        builtin::namespace(),
        vec![Extension::new(
            discord::EXTENSION,
            config.discord_enabled,
            Some(discord::namespace()),
        )],
    );
    for path in &catalog.report.failed {
        eprintln!("warning: could not load {path}");
    }

    let repo_dir = match config.repo_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("reading the working directory")?,
    };
    let services = Services {
        discord: None,
        updater: Some(Arc::new(GitUpdater::new(repo_dir)) as Arc<dyn Updater>),
    };

    let input = TerminalInput::new().context("opening the terminal")?;
    let mut shell = Interpreter::new(catalog, Box::new(input), services)
        .with_prompt(config.prompt)
        .with_timeout(config.handler_timeout);

    let result = shell.run().await;
    logging::shutdown();
    result.context("shell terminated")
}
