//! Self-update capability.
//!
//! The dispatch core never runs external processes; commands that need to
//! refresh a checkout go through the [`Updater`] handle in the shell context.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    /// The upstream branch has `behind` commits not present locally.
    Stale { behind: u64 },
}

#[async_trait]
pub trait Updater: Send + Sync {
    /// Fetch from the remote and compare against the local checkout.
    async fn check_remote(&self) -> Result<UpdateStatus>;

    /// Bring the local checkout up to date.
    async fn pull(&self) -> Result<()>;
}

/// [`Updater`] backed by the `git` executable.
pub struct GitUpdater {
    repo_dir: PathBuf,
}

impl GitUpdater {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    async fn git<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let rendered = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(repo = %self.repo_dir.display(), command = %rendered, "running git");

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.repo_dir)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to spawn `git {rendered}`"))?;

        if !output.status.success() {
            bail!(
                "`git {rendered}` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Updater for GitUpdater {
    async fn check_remote(&self) -> Result<UpdateStatus> {
        self.git(["submodule", "update", "--init", "--recursive"]).await?;
        self.git(["fetch"]).await?;
        let count = self.git(["rev-list", "--count", "HEAD..@{u}"]).await?;
        parse_behind(&count)
    }

    async fn pull(&self) -> Result<()> {
        self.git(["pull", "--ff-only"]).await?;
        Ok(())
    }
}

fn parse_behind(count: &str) -> Result<UpdateStatus> {
    let behind: u64 = count
        .trim()
        .parse()
        .with_context(|| format!("unexpected commit count `{count}`"))?;
    Ok(match behind {
        0 => UpdateStatus::UpToDate,
        behind => UpdateStatus::Stale { behind },
    })
}
