use chrono::{DateTime, Utc};
use git2::{ObjectType, Repository, Sort};
use std::collections::HashSet;

use crate::error::Result;
use crate::git::repository::WorkingCopy;
use crate::models::{EntryType, TreeNode};

/// Narrows a tree to files touched by matching commits. An inactive filter
/// keeps the whole tree.
#[derive(Debug, Default, Clone)]
pub struct TreeFilter {
    pub author: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TreeFilter {
    pub fn is_active(&self) -> bool {
        self.author.is_some() || self.since.is_some() || self.until.is_some()
    }
}

impl WorkingCopy {
    pub fn build_tree(&self, filter: &TreeFilter) -> Result<Vec<TreeNode>> {
        let repo = self.repo();
        let head = repo.head()?;
        let commit = head.peel_to_commit()?;
        let tree = commit.tree()?;

        let touched = if filter.is_active() {
            Some(touched_paths(repo, filter)?)
        } else {
            None
        };

        Ok(build_nodes(repo, &tree, "", touched.as_ref()))
    }
}

fn build_nodes(
    repo: &Repository,
    tree: &git2::Tree,
    base_path: &str,
    touched: Option<&HashSet<String>>,
) -> Vec<TreeNode> {
    let mut entries = Vec::new();

    for entry in tree.iter() {
        let name = entry.name().unwrap_or("").to_string();
        let path = if base_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", base_path, name)
        };

        let entry_type = match entry.kind() {
            Some(ObjectType::Blob) => EntryType::File,
            Some(ObjectType::Tree) => EntryType::Directory,
            Some(ObjectType::Commit) => EntryType::Submodule,
            _ => continue,
        };

        if entry_type == EntryType::Directory {
            let children = entry
                .to_object(repo)
                .ok()
                .and_then(|obj| {
                    obj.as_tree()
                        .map(|subtree| build_nodes(repo, subtree, &path, touched))
                })
                .unwrap_or_default();

            // filtered directories survive only through their descendants
            if touched.is_some() && children.is_empty() {
                continue;
            }

            entries.push(TreeNode {
                name,
                path,
                entry_type,
                children: Some(children),
            });
        } else {
            if let Some(set) = touched {
                if !set.contains(&path) {
                    continue;
                }
            }
            entries.push(TreeNode {
                name,
                path,
                entry_type,
                children: None,
            });
        }
    }

    // Sort: directories first, then files, alphabetically
    entries.sort_by(|a, b| match (&a.entry_type, &b.entry_type) {
        (EntryType::Directory, EntryType::Directory) => {
            a.name.to_lowercase().cmp(&b.name.to_lowercase())
        }
        (EntryType::Directory, _) => std::cmp::Ordering::Less,
        (_, EntryType::Directory) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    entries
}

/// Paths touched by commits matching the filter, collected from each
/// commit's diff against its first parent.
fn touched_paths(repo: &Repository, filter: &TreeFilter) -> Result<HashSet<String>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push_head()?;

    let mut paths = HashSet::new();

    for oid in revwalk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if !commit_matches(&commit, filter) {
            continue;
        }
        collect_delta_paths(repo, &commit, &mut paths)?;
    }

    Ok(paths)
}

fn commit_matches(commit: &git2::Commit, filter: &TreeFilter) -> bool {
    if let Some(author) = &filter.author {
        let sig = commit.author();
        let name_match = sig.name().is_some_and(|n| n == author);
        let email_match = sig.email().is_some_and(|e| e == author);
        if !name_match && !email_match {
            return false;
        }
    }

    let timestamp = commit.time().seconds();
    if let Some(since) = filter.since {
        if timestamp < since.timestamp() {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if timestamp > until.timestamp() {
            return false;
        }
    }
    true
}

fn collect_delta_paths(
    repo: &Repository,
    commit: &git2::Commit,
    out: &mut HashSet<String>,
) -> Result<()> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    for delta in diff.deltas() {
        if let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) {
            out.insert(path.to_string());
        }
        if let Some(path) = delta.old_file().path().and_then(|p| p.to_str()) {
            out.insert(path.to_string());
        }
    }

    Ok(())
}
