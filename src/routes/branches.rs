//! Branch endpoints.
//!
//! - GET /api/v1/repository/branch?repo_url=<url>
//!   HEAD branch of a fresh clone of the repository.
//!
//! - GET /api/v1/repository/branches?repo_url=<url>
//!   All local and remote branches with current branch flagged.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::git::WorkingCopy;
use crate::git::cli::validate_ref;
use crate::models::{BranchInfo, CurrentBranch};
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository/branch", get(get_current_branch))
        .route("/api/v1/repository/branches", get(list_branches))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RepoQuery {
    repo_url: Option<String>,
}

async fn get_current_branch(
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<CurrentBranch>> {
    let repo_url = query.repo_url.ok_or(AppError::MissingParam("repo_url"))?;
    validate_ref(&repo_url).map_err(AppError::InvalidParam)?;

    let workspace = super::provision(&state, &repo_url).await?;
    let path = workspace.path().to_path_buf();
    let current_branch = tokio::task::spawn_blocking(move || -> Result<String> {
        WorkingCopy::open(&path)?.current_branch()
    })
    .await
    .map_err(|_| AppError::Internal("blocking task failed".to_string()))??;

    Ok(Json(CurrentBranch { current_branch }))
}

async fn list_branches(
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<Vec<BranchInfo>>> {
    let repo_url = query.repo_url.ok_or(AppError::MissingParam("repo_url"))?;
    validate_ref(&repo_url).map_err(AppError::InvalidParam)?;

    let workspace = super::provision(&state, &repo_url).await?;
    let path = workspace.path().to_path_buf();
    let branches = tokio::task::spawn_blocking(move || -> Result<Vec<BranchInfo>> {
        WorkingCopy::open(&path)?.list_branches()
    })
    .await
    .map_err(|_| AppError::Internal("blocking task failed".to_string()))??;

    Ok(Json(branches))
}
