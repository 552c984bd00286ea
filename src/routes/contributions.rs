//! Contribution statistics endpoint.
//!
//! GET /api/v1/repository/contributions?repo_url=<url>&branch=<branch>
//!
//! Returns file path → author → {lines_added, lines_deleted, percentage}
//! for every tracked file of the repository at `branch` (default `main`).
//! Any failure inside the computation maps to one opaque 500; details land
//! in the log only.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::git::cli::validate_ref;
use crate::git::contributions::compute_contributions;
use crate::models::ContributionStats;
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository/contributions", get(get_contributions))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ContributionsQuery {
    repo_url: Option<String>,
    #[serde(default = "default_branch")]
    branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

async fn get_contributions(
    State(state): State<AppState>,
    Query(query): Query<ContributionsQuery>,
) -> Result<Json<ContributionStats>> {
    let repo_url = query.repo_url.ok_or(AppError::MissingParam("repo_url"))?;
    validate_ref(&repo_url).map_err(AppError::InvalidParam)?;
    validate_ref(&query.branch).map_err(AppError::InvalidParam)?;

    let stats = compute_contributions(&state.workspaces_root, &repo_url, &query.branch).await?;
    Ok(Json(stats))
}
