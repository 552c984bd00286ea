//! Repository registry DTOs.
//!
//! - `RepoRecord`: Stored repository row (returned by list/register)
//! - `RegisterRepository`: POST body for registering a repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRepository {
    pub url: String,
    pub name: Option<String>,
}
