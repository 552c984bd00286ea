//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! Error mappings:
//! - `RepoNotFound` → 404
//! - `MissingParam`, `InvalidParam`, `BranchNotFound` → 400
//! - `Git`, `Database`, `Aggregation`, `Internal` → 500
//!
//! `Aggregation` carries no detail on purpose: every provisioning, sync or
//! history failure inside the contribution computation surfaces as the same
//! message, and the underlying cause only goes to the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Repository not registered: {0}")]
    RepoNotFound(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("could not compute contributions")]
    Aggregation,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Git(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::RepoNotFound(url) => {
                (StatusCode::NOT_FOUND, format!("Repository not registered: {}", url))
            }
            AppError::BranchNotFound(branch) => {
                (StatusCode::BAD_REQUEST, format!("Branch not found: {}", branch))
            }
            AppError::MissingParam(name) => {
                (StatusCode::BAD_REQUEST, format!("Missing required parameter: {}", name))
            }
            AppError::InvalidParam(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Aggregation => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
