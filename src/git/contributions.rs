//! Per-file, per-author contribution attribution.
//!
//! Each tracked file's history is rendered by `git log --pretty=format:%an
//! --numstat --follow` as an author line followed by one `added<TAB>deleted`
//! line per commit. A two-state machine replays those lines: a tab-free line
//! establishes the attribution context, a tabbed line credits a numeric pair
//! to it. Binary files carry no usable line stats, so a single owner is
//! attributed wholesale instead.
//!
//! Any provisioning, sync or history failure aborts the whole computation
//! and surfaces as one opaque `AppError::Aggregation`; the cause is logged.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use mime_guess::mime;
use tracing::error;

use crate::error::AppError;
use crate::git::cli::GitCli;
use crate::git::workspace::Workspace;
use crate::models::{AuthorStats, ContributionStats};

/// Owner recorded for a binary file whose history names no author at all.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

pub async fn compute_contributions(
    workspaces_root: &Path,
    repo_url: &str,
    branch: &str,
) -> crate::error::Result<ContributionStats> {
    match compute_inner(workspaces_root, repo_url, branch).await {
        Ok(stats) => Ok(stats),
        Err(err) => {
            error!(repo_url, branch, error = ?err, "contribution aggregation failed");
            Err(AppError::Aggregation)
        }
    }
}

async fn compute_inner(
    workspaces_root: &Path,
    repo_url: &str,
    branch: &str,
) -> anyhow::Result<ContributionStats> {
    // The guard removes the clone on every exit path below.
    let workspace = Workspace::prepare(workspaces_root, repo_url).await?;
    let git = GitCli::new(workspace.path());

    git.sync_branch(branch)
        .await
        .with_context(|| format!("failed to sync branch {}", branch))?;

    let raw_files = git.ls_files().await?;
    let files: Vec<String> = raw_files
        .lines()
        .map(normalize_path)
        .filter(|f| !f.is_empty())
        .collect();

    let mut contributions = ContributionStats::new();

    for file_path in files {
        let log = git
            .file_history(&file_path)
            .await
            .with_context(|| format!("history query failed for {}", file_path))?;
        let history = parse_history(&log);

        if is_binary_path(&file_path) {
            let owner = binary_owner(&git, &file_path, history.last_author).await?;
            contributions.entry(file_path).or_default().insert(
                owner,
                AuthorStats {
                    lines_added: 0,
                    lines_deleted: 0,
                    percentage: 100.0,
                },
            );
        } else {
            if history.edits.is_empty() {
                continue;
            }
            let per_file = contributions.entry(file_path).or_default();
            for (author, edits) in history.edits {
                per_file.insert(
                    author,
                    AuthorStats {
                        lines_added: edits.added,
                        lines_deleted: edits.deleted,
                        percentage: percentage(edits, history.total_modified),
                    },
                );
            }
        }
    }

    Ok(contributions)
}

/// Owner of a binary file: the final attribution context of the numstat
/// parse when there is one, otherwise the author of the oldest commit
/// touching the path, otherwise the sentinel. The oldest-first re-query is
/// load-bearing: numstat output for some histories never yields a context.
async fn binary_owner(
    git: &GitCli,
    path: &str,
    last_author: Option<String>,
) -> anyhow::Result<String> {
    if let Some(author) = last_author {
        return Ok(author);
    }
    Ok(git
        .first_author(path)
        .await?
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()))
}

/// Canonicalize one `ls-files` output line: trim and unify separators.
pub fn normalize_path(raw: &str) -> String {
    raw.trim().replace('\\', "/")
}

/// Extension-based binary/text classification. Structured `+xml`/`+json`
/// types (svg and friends) diff as text despite their media type.
pub fn is_binary_path(path: &str) -> bool {
    let Some(guess) = mime_guess::from_path(path).first() else {
        return false;
    };
    if guess
        .suffix()
        .is_some_and(|s| s == mime::XML || s == mime::JSON)
    {
        return false;
    }
    if guess.type_() == mime::TEXT {
        return false;
    }
    if guess.type_() == mime::APPLICATION {
        return !matches!(
            guess.subtype().as_str(),
            "json" | "xml" | "javascript" | "ecmascript" | "x-sh" | "toml" | "yaml" | "x-yaml"
        );
    }
    true
}

#[derive(Debug, Default, Clone, Copy)]
struct EditTotals {
    added: u64,
    deleted: u64,
}

#[derive(Debug, Default)]
struct FileHistory {
    edits: HashMap<String, EditTotals>,
    total_modified: u64,
    /// Final attribution context, None when the parse never saw an author
    /// line (or a trailing separator cleared it).
    last_author: Option<String>,
}

enum ParseState {
    AwaitingAuthor,
    AwaitingStat { author: String },
}

fn parse_history(output: &str) -> FileHistory {
    let mut edits: HashMap<String, EditTotals> = HashMap::new();
    let mut total_modified = 0u64;
    let mut state = ParseState::AwaitingAuthor;

    for line in output.lines() {
        if !line.contains('\t') {
            let author = line.trim();
            state = if author.is_empty() {
                ParseState::AwaitingAuthor
            } else {
                ParseState::AwaitingStat {
                    author: author.to_string(),
                }
            };
        } else if let ParseState::AwaitingStat { author } = &state {
            let mut fields = line.split('\t');
            let added = parse_stat_field(fields.next());
            let deleted = parse_stat_field(fields.next());

            let entry = edits.entry(author.clone()).or_default();
            entry.added += added;
            entry.deleted += deleted;
            total_modified += added + deleted;
        }
        // a stat line with no attribution context is dropped
    }

    let last_author = match state {
        ParseState::AwaitingStat { author } => Some(author),
        ParseState::AwaitingAuthor => None,
    };

    FileHistory {
        edits,
        total_modified,
        last_author,
    }
}

/// Numstat fields that fail to parse (including git's `-` for binary
/// content) coerce to 0.
fn parse_stat_field(field: Option<&str>) -> u64 {
    field.and_then(|f| f.trim().parse().ok()).unwrap_or(0)
}

fn percentage(edits: EditTotals, total_modified: u64) -> f64 {
    if total_modified > 0 {
        (edits.added + edits.deleted) as f64 / total_modified as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{commit_file_as, has_git, init_repo};
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_attributes_pairs_to_the_preceding_author() {
        let history = parse_history("Alice\n10\t2\treadme.txt\n\nBob\n5\t0\treadme.txt");

        assert_eq!(history.edits.len(), 2);
        assert_eq!(history.edits["Alice"].added, 10);
        assert_eq!(history.edits["Alice"].deleted, 2);
        assert_eq!(history.edits["Bob"].added, 5);
        assert_eq!(history.edits["Bob"].deleted, 0);
        assert_eq!(history.total_modified, 17);
        assert_eq!(history.last_author.as_deref(), Some("Bob"));
    }

    #[test]
    fn parse_coerces_malformed_fields_to_zero() {
        let history = parse_history("Alice\nabc\t3\tnotes.txt");

        assert_eq!(history.edits["Alice"].added, 0);
        assert_eq!(history.edits["Alice"].deleted, 3);
        assert_eq!(history.total_modified, 3);
    }

    #[test]
    fn parse_treats_binary_numstat_dashes_as_zero() {
        let history = parse_history("Carol\n-\t-\tlogo.png");

        assert_eq!(history.edits["Carol"].added, 0);
        assert_eq!(history.edits["Carol"].deleted, 0);
        assert_eq!(history.total_modified, 0);
        assert_eq!(history.last_author.as_deref(), Some("Carol"));
    }

    #[test]
    fn parse_drops_stat_lines_with_no_context() {
        let history = parse_history("7\t7\torphan.txt\nAlice\n1\t0\torphan.txt");

        assert_eq!(history.edits["Alice"].added, 1);
        assert_eq!(history.total_modified, 1);
    }

    #[test]
    fn parse_lets_consecutive_author_lines_replace_context() {
        let history = parse_history("Alice\nBob\n4\t1\tfile.txt");

        assert!(!history.edits.contains_key("Alice"));
        assert_eq!(history.edits["Bob"].added, 4);
        assert_eq!(history.last_author.as_deref(), Some("Bob"));
    }

    #[test]
    fn parse_of_empty_output_yields_nothing() {
        let history = parse_history("");

        assert!(history.edits.is_empty());
        assert_eq!(history.total_modified, 0);
        assert_eq!(history.last_author, None);
    }

    #[test]
    fn percentage_is_share_of_total_churn() {
        let alice = EditTotals {
            added: 10,
            deleted: 2,
        };
        let bob = EditTotals {
            added: 5,
            deleted: 0,
        };

        assert!((percentage(alice, 17) - 70.588).abs() < 0.01);
        assert!((percentage(bob, 17) - 29.412).abs() < 0.01);
        assert!((percentage(alice, 17) + percentage(bob, 17) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(EditTotals::default(), 0), 0.0);
    }

    #[test]
    fn classifies_paths_by_extension() {
        assert!(is_binary_path("assets/logo.png"));
        assert!(is_binary_path("intro.mp4"));
        assert!(is_binary_path("fonts/inter.woff2"));
        assert!(is_binary_path("release.zip"));
        assert!(is_binary_path("manual.pdf"));

        assert!(!is_binary_path("src/main.rs"));
        assert!(!is_binary_path("readme.txt"));
        assert!(!is_binary_path("package.json"));
        assert!(!is_binary_path("icons/arrow.svg"));
        assert!(!is_binary_path("Dockerfile"));
    }

    #[test]
    fn normalize_path_trims_and_unifies_separators() {
        assert_eq!(normalize_path("  src\\git\\cli.rs \n"), "src/git/cli.rs");
        assert_eq!(normalize_path(""), "");
    }

    #[tokio::test]
    async fn attributes_line_churn_per_author() {
        if !has_git() {
            return;
        }
        let origin = tempfile::tempdir().unwrap();
        init_repo(origin.path());

        // Alice: 8 lines added, then 2 replaced (10 added / 2 deleted total)
        commit_file_as(
            origin.path(),
            "readme.txt",
            b"a1\na2\na3\na4\na5\na6\na7\na8\n",
            "Alice",
            "alice@example.com",
        );
        commit_file_as(
            origin.path(),
            "readme.txt",
            b"a1\na2\nx3\na4\nx5\na6\na7\na8\n",
            "Alice",
            "alice@example.com",
        );
        // Bob appends 5 lines
        commit_file_as(
            origin.path(),
            "readme.txt",
            b"a1\na2\nx3\na4\nx5\na6\na7\na8\nb1\nb2\nb3\nb4\nb5\n",
            "Bob",
            "bob@example.com",
        );

        let workspaces = tempfile::tempdir().unwrap();
        let url = origin.path().to_str().unwrap();
        let stats = compute_contributions(workspaces.path(), url, "main")
            .await
            .unwrap();

        let readme = &stats["readme.txt"];
        assert_eq!(readme["Alice"].lines_added, 10);
        assert_eq!(readme["Alice"].lines_deleted, 2);
        assert_eq!(readme["Bob"].lines_added, 5);
        assert_eq!(readme["Bob"].lines_deleted, 0);
        assert!((readme["Alice"].percentage - 70.588).abs() < 0.01);
        assert!((readme["Bob"].percentage - 29.412).abs() < 0.01);

        let total: f64 = readme.values().map(|a| a.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);

        // clone directories are gone once the computation returns
        assert_eq!(std::fs::read_dir(workspaces.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn binary_files_get_a_single_full_owner() {
        if !has_git() {
            return;
        }
        let origin = tempfile::tempdir().unwrap();
        init_repo(origin.path());
        commit_file_as(
            origin.path(),
            "logo.png",
            &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x01],
            "Carol",
            "carol@example.com",
        );

        let workspaces = tempfile::tempdir().unwrap();
        let url = origin.path().to_str().unwrap();
        let stats = compute_contributions(workspaces.path(), url, "main")
            .await
            .unwrap();

        let logo = &stats["logo.png"];
        assert_eq!(logo.len(), 1);
        assert_eq!(logo["Carol"].lines_added, 0);
        assert_eq!(logo["Carol"].lines_deleted, 0);
        assert_eq!(logo["Carol"].percentage, 100.0);
    }

    #[tokio::test]
    async fn rerunning_the_aggregation_is_idempotent() {
        if !has_git() {
            return;
        }
        let origin = tempfile::tempdir().unwrap();
        init_repo(origin.path());
        commit_file_as(
            origin.path(),
            "src/lib.rs",
            b"pub fn hi() {}\n",
            "Alice",
            "alice@example.com",
        );
        commit_file_as(
            origin.path(),
            "src/lib.rs",
            b"pub fn hi() {}\npub fn bye() {}\n",
            "Bob",
            "bob@example.com",
        );

        let workspaces = tempfile::tempdir().unwrap();
        let url = origin.path().to_str().unwrap();
        let first = compute_contributions(workspaces.path(), url, "main")
            .await
            .unwrap();
        let second = compute_contributions(workspaces.path(), url, "main")
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn binary_owner_falls_back_to_oldest_commit_then_sentinel() {
        if !has_git() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file_as(
            dir.path(),
            "icon.ico",
            &[0x00, 0x00, 0x01, 0x00],
            "Dana",
            "dana@example.com",
        );
        commit_file_as(
            dir.path(),
            "icon.ico",
            &[0x00, 0x00, 0x01, 0x00, 0x02],
            "Erin",
            "erin@example.com",
        );
        let git = GitCli::new(dir.path());

        // an existing context short-circuits the re-query
        let owner = binary_owner(&git, "icon.ico", Some("Frank".to_string()))
            .await
            .unwrap();
        assert_eq!(owner, "Frank");

        // no context: oldest-first query wins
        let owner = binary_owner(&git, "icon.ico", None).await.unwrap();
        assert_eq!(owner, "Dana");

        // path with no history at all: sentinel
        let owner = binary_owner(&git, "never-committed.bin", None).await.unwrap();
        assert_eq!(owner, UNKNOWN_AUTHOR);
    }

    #[tokio::test]
    async fn failures_surface_as_one_opaque_error() {
        if !has_git() {
            return;
        }
        let workspaces = tempfile::tempdir().unwrap();
        let missing = workspaces.path().join("no-such-repo");

        let err = compute_contributions(workspaces.path(), missing.to_str().unwrap(), "main")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Aggregation));

        // a bad branch on a real repository is just as opaque
        let origin = tempfile::tempdir().unwrap();
        init_repo(origin.path());
        commit_file_as(
            origin.path(),
            "a.txt",
            b"hello\n",
            "Alice",
            "alice@example.com",
        );
        let err = compute_contributions(
            workspaces.path(),
            origin.path().to_str().unwrap(),
            "does-not-exist",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Aggregation));

        // failed runs release their working copies too
        assert_eq!(std::fs::read_dir(workspaces.path()).unwrap().count(), 0);
    }
}
