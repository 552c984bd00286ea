//! Working-copy provisioning.
//!
//! Each computation gets its own throwaway clone under the configured
//! workspace root. `Workspace` removes its directory when dropped, so every
//! exit path (success or failure) releases the copy. Directory names carry
//! a per-process sequence number, so concurrent requests for the same URL
//! never share a clone.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use tracing::{debug, warn};

use crate::git::cli::GitCli;

static WORKSPACE_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Clone `repo_url` into a fresh directory under `root`.
    pub async fn prepare(root: &Path, repo_url: &str) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("failed to create workspace root {}", root.display()))?;

        let dir_name = workspace_dir_name(repo_url);
        let path = root.join(&dir_name);
        if path.exists() {
            // leftover from a crashed run
            let _ = tokio::fs::remove_dir_all(&path).await;
        }

        GitCli::new(root)
            .run(&["clone", repo_url, &dir_name])
            .await
            .with_context(|| format!("failed to clone {}", repo_url))?;

        debug!(path = %path.display(), "provisioned working copy");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "failed to remove working copy");
            }
        } else {
            debug!(path = %self.path.display(), "removed working copy");
        }
    }
}

fn workspace_dir_name(repo_url: &str) -> String {
    let tail = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repo")
        .trim_end_matches(".git");
    let tail: String = tail
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let tail = if tail.is_empty() {
        "repo".to_string()
    } else {
        tail
    };

    let mut hasher = DefaultHasher::new();
    repo_url.hash(&mut hasher);
    let seq = WORKSPACE_SEQ.fetch_add(1, Ordering::Relaxed);

    format!("{}-{:016x}-{}", tail, hasher.finish(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names_are_unique_per_request() {
        let url = "https://example.com/team/project.git";
        let a = workspace_dir_name(url);
        let b = workspace_dir_name(url);
        assert!(a.starts_with("project-"));
        assert_ne!(a, b);
    }

    #[test]
    fn dir_names_survive_odd_urls() {
        assert!(workspace_dir_name("https://example.com/").starts_with("examplecom-"));
        assert!(workspace_dir_name("git@host:team/weird name.git").starts_with("weirdname-"));
        assert!(workspace_dir_name("///").starts_with("repo-"));
    }

    #[test]
    fn drop_removes_the_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("scratch");
        std::fs::create_dir_all(path.join("sub")).unwrap();
        std::fs::write(path.join("sub/file.txt"), "x").unwrap();

        let workspace = Workspace { path: path.clone() };
        assert!(path.exists());
        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace {
            path: root.path().join("never-created"),
        };
        drop(workspace);
    }
}
