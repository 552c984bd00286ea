use git2::{BranchType, Repository};
use std::path::Path;

use crate::error::Result;
use crate::models::BranchInfo;

/// Read-only git2 handle over a provisioned working copy.
pub struct WorkingCopy {
    repo: Repository,
}

impl WorkingCopy {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            repo: Repository::open(path)?,
        })
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Shorthand of HEAD, `HEAD` when detached.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if head.is_branch() {
            Ok(head.shorthand().unwrap_or("HEAD").to_string())
        } else {
            Ok("HEAD".to_string())
        }
    }

    pub fn list_branches(&self) -> Result<Vec<BranchInfo>> {
        let current = self.repo.head().ok().and_then(|h| {
            if h.is_branch() {
                h.shorthand().map(String::from)
            } else {
                None
            }
        });

        let mut branches = Vec::new();
        for entry in self.repo.branches(None)? {
            let (branch, branch_type) = entry?;
            let Some(name) = branch.name()?.map(String::from) else {
                continue;
            };
            let is_remote = branch_type == BranchType::Remote;
            if is_remote && name.ends_with("/HEAD") {
                continue;
            }
            let is_current = !is_remote && current.as_deref() == Some(name.as_str());
            branches.push(BranchInfo {
                name,
                is_current,
                is_remote,
            });
        }
        Ok(branches)
    }

    /// Existence check covering the remote-qualified names a fresh clone
    /// carries: `feature/x` matches `origin/feature/x`.
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        for entry in self.repo.branches(None)? {
            let (branch, branch_type) = entry?;
            if let Some(candidate) = branch.name()? {
                let stripped = match branch_type {
                    BranchType::Remote => candidate.strip_prefix("origin/").unwrap_or(candidate),
                    BranchType::Local => candidate,
                };
                if stripped == name {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
