//! API route handlers - maps HTTP endpoints to git operations.
//!
//! Each submodule defines routes for a feature area:
//! - `contributions`: Per-file, per-author contribution statistics
//! - `tree`: Filtered directory tree of a registered repository
//! - `branches`: Current branch and branch listing
//! - `repositories`: The repository registry

pub mod branches;
pub mod contributions;
pub mod repositories;
pub mod tree;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tracing::error;

use crate::error::{AppError, Result};
use crate::git::workspace::Workspace;
use crate::store::RepoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RepoStore>,
    pub workspaces_root: PathBuf,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(contributions::routes(state.clone()))
        .merge(tree::routes(state.clone()))
        .merge(branches::routes(state.clone()))
        .merge(repositories::routes(state))
}

/// Clone the repository for one request, logging the cause and handing the
/// caller a generic error on failure.
pub(crate) async fn provision(state: &AppState, repo_url: &str) -> Result<Workspace> {
    Workspace::prepare(&state.workspaces_root, repo_url)
        .await
        .map_err(|err| {
            error!(repo_url, error = ?err, "failed to provision working copy");
            AppError::Internal("could not prepare repository".to_string())
        })
}
