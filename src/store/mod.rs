//! Repository registry backed by SQLite.
//!
//! One table of registered repositories; the tree endpoint refuses URLs that
//! have no record here. The connection lives behind a mutex so the store can
//! be shared across handlers.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, Result};
use crate::models::RepoRecord;

pub struct RepoStore {
    conn: Mutex<Connection>,
}

impl RepoStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_repositories_url ON repositories(url);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))
    }

    /// Insert a repository, or return the existing record when the URL is
    /// already registered.
    pub fn register(&self, name: &str, url: &str) -> Result<RepoRecord> {
        {
            let conn = self.lock()?;
            conn.execute(
                "INSERT OR IGNORE INTO repositories (name, url, created_at) VALUES (?1, ?2, ?3)",
                params![name, url, Utc::now()],
            )?;
        }
        self.find_by_url(url)?
            .ok_or_else(|| AppError::Internal(format!("registration lost for {}", url)))
    }

    pub fn find_by_url(&self, url: &str) -> Result<Option<RepoRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT id, name, url, created_at FROM repositories WHERE url = ?1",
                params![url],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<RepoRecord>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, url, created_at FROM repositories ORDER BY name")?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RepoRecord> {
    Ok(RepoRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        created_at: row.get::<_, DateTime<Utc>>(3)?,
    })
}
