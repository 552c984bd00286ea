//! Shared test fixtures: throwaway git repositories built with the real
//! `git` binary. Tests that need one call `has_git()` first and bail out
//! quietly when the binary is unavailable.

use std::fs;
use std::path::Path;
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn init_repo(dir: &Path) {
    assert!(
        Command::new("git")
            .args(["init"])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
    // pin the branch name regardless of init.defaultBranch
    assert!(
        Command::new("git")
            .args(["symbolic-ref", "HEAD", "refs/heads/main"])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
    assert!(
        Command::new("git")
            .args(["config", "user.email", "committer@example.com"])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
    assert!(
        Command::new("git")
            .args(["config", "user.name", "Committer"])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
    assert!(
        Command::new("git")
            .args(["config", "core.autocrlf", "false"])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
}

pub fn commit_file_as(dir: &Path, name: &str, content: &[u8], author: &str, email: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    assert!(
        Command::new("git")
            .args(["add", "."])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
    assert!(
        Command::new("git")
            .args([
                "commit",
                "-m",
                &format!("update {name}"),
                "--author",
                &format!("{author} <{email}>"),
            ])
            .current_dir(dir)
            .status()
            .unwrap()
            .success()
    );
}
