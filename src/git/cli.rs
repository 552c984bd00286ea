//! Async wrappers around the `git` binary.
//!
//! Everything that touches the network (clone, fetch, pull) or needs
//! `--numstat`/`--follow` log output shells out through here with
//! `tokio::process::Command`. Read-only inspection of an already-provisioned
//! working copy goes through git2 instead (see `repository.rs` / `tree.rs`).

use std::path::PathBuf;

use anyhow::{Context, bail};
use tokio::process::Command;

/// Reject values that could be parsed as CLI flags or smuggle control
/// characters into a git invocation.
pub fn validate_ref(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Invalid git ref: empty".to_string());
    }
    if value.starts_with('-') {
        return Err(format!("Invalid git ref: '{}'", value));
    }
    if value.contains('\0') || value.contains('\n') || value.contains('\r') {
        return Err("Invalid git ref: contains forbidden characters".to_string());
    }
    Ok(())
}

/// Runs git subcommands inside one working directory.
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run a git command and return its stdout, with stderr folded into the
    /// error on a non-zero exit.
    pub async fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .with_context(|| format!("failed to run git {}", args.first().unwrap_or(&"")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Bring `branch` up to date with origin: prune stale remote refs, check
    /// the branch out and force-pull it.
    pub async fn sync_branch(&self, branch: &str) -> anyhow::Result<()> {
        self.run(&["fetch", "--prune", "origin"]).await?;
        self.run(&["checkout", branch]).await?;
        self.run(&["pull", "--force", "origin", branch]).await?;
        Ok(())
    }

    /// Raw `ls-files` output: every path known to the index at the
    /// checked-out revision, one per line.
    pub async fn ls_files(&self) -> anyhow::Result<String> {
        self.run(&["ls-files"]).await
    }

    /// Full history of `path` rendered as an author line followed by one
    /// `added<TAB>deleted` numstat line per commit, newest first. Renames
    /// are followed so history survives file moves.
    pub async fn file_history(&self, path: &str) -> anyhow::Result<String> {
        self.run(&["log", "--pretty=format:%an", "--numstat", "--follow", "--", path])
            .await
    }

    /// Author of the oldest commit touching `path`, if any.
    pub async fn first_author(&self, path: &str) -> anyhow::Result<Option<String>> {
        let raw = self
            .run(&["log", "--format=%an", "--follow", "--reverse", "--", path])
            .await?;
        Ok(raw
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(String::from))
    }
}
