//! Directory-tree endpoint.
//!
//! GET /api/v1/repository/tree?repo_url=<url>&branch=&author=&since=&until=
//!
//! Resolves the registered repository record (404 when unregistered),
//! provisions a working copy, optionally checks out and synchronizes a
//! requested branch (400 when absent), and returns the recursive tree.
//! `author` narrows the tree to files that author touched; `since`/`until`
//! are `YYYY-MM-DD` bounds (until is inclusive end-of-day) and unparseable
//! values are ignored. An author filter matching nothing yields an empty
//! tree plus a warning.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::error;

use crate::error::{AppError, Result};
use crate::git::WorkingCopy;
use crate::git::cli::{GitCli, validate_ref};
use crate::git::tree::TreeFilter;
use crate::models::{TreeNode, TreeResponse};
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository/tree", get(get_tree))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct TreeQuery {
    repo_url: Option<String>,
    branch: Option<String>,
    author: Option<String>,
    since: Option<String>,
    until: Option<String>,
}

async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<TreeResponse>> {
    let repo_url = query.repo_url.ok_or(AppError::MissingParam("repo_url"))?;
    validate_ref(&repo_url).map_err(AppError::InvalidParam)?;
    if let Some(branch) = &query.branch {
        validate_ref(branch).map_err(AppError::InvalidParam)?;
    }

    state
        .store
        .find_by_url(&repo_url)?
        .ok_or_else(|| AppError::RepoNotFound(repo_url.clone()))?;

    let author = query
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    let filter = TreeFilter {
        author: author.clone(),
        since: parse_date_param(query.since.as_deref(), false),
        until: parse_date_param(query.until.as_deref(), true),
    };

    let workspace = super::provision(&state, &repo_url).await?;

    if let Some(branch) = &query.branch {
        let path = workspace.path().to_path_buf();
        let requested = branch.clone();
        let exists = tokio::task::spawn_blocking(move || -> Result<bool> {
            WorkingCopy::open(&path)?.branch_exists(&requested)
        })
        .await
        .map_err(|_| AppError::Internal("blocking task failed".to_string()))??;
        if !exists {
            return Err(AppError::BranchNotFound(branch.clone()));
        }

        GitCli::new(workspace.path())
            .sync_branch(branch)
            .await
            .map_err(|err| {
                error!(%repo_url, %branch, error = ?err, "failed to sync branch");
                AppError::Internal("could not sync branch".to_string())
            })?;
    }

    let path = workspace.path().to_path_buf();
    let tree = tokio::task::spawn_blocking(move || -> Result<Vec<TreeNode>> {
        WorkingCopy::open(&path)?.build_tree(&filter)
    })
    .await
    .map_err(|_| AppError::Internal("blocking task failed".to_string()))??;

    let warning = match &author {
        Some(author) if tree.is_empty() => Some(format!("No commits by author '{}'.", author)),
        _ => None,
    };

    Ok(Json(TreeResponse { tree, warning }))
}

/// `YYYY-MM-DD` → UTC instant; until-bounds land on inclusive end-of-day.
/// Anything unparseable is treated as absent.
fn parse_date_param(value: Option<&str>, is_until: bool) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()?;
    let time = if is_until {
        date.and_hms_milli_opt(23, 59, 59, 999)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(Utc.from_utc_datetime(&time))
}
