//! Repository registry endpoints.
//!
//! - POST /api/v1/repositories { url, name? }
//!   Registers a repository (idempotent per URL); name defaults from the
//!   URL tail.
//!
//! - GET /api/v1/repositories
//!   Lists registered repositories.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::{AppError, Result};
use crate::git::cli::validate_ref;
use crate::models::{RegisterRepository, RepoRecord};
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/repositories",
            get(list_repositories).post(register_repository),
        )
        .with_state(state)
}

async fn register_repository(
    State(state): State<AppState>,
    Json(body): Json<RegisterRepository>,
) -> Result<Json<RepoRecord>> {
    validate_ref(&body.url).map_err(AppError::InvalidParam)?;

    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name_from_url(&body.url));

    let record = state.store.register(&name, &body.url)?;
    Ok(Json(record))
}

async fn list_repositories(State(state): State<AppState>) -> Result<Json<Vec<RepoRecord>>> {
    Ok(Json(state.store.list()?))
}

fn name_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repository")
        .trim_end_matches(".git")
        .to_string()
}
