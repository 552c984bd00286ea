//! repo-insight - contribution analytics for remote git repositories
//!
//! # Usage
//! ```bash
//! repo-insight                          # Start server on port 3001
//! repo-insight --port 8080              # Custom port
//! repo-insight --data-dir /var/lib/ri   # Registry database and clone root
//! ```
//!
//! Endpoints (all under /api/v1):
//! - `GET /repository/contributions` - per-file, per-author line statistics
//! - `GET /repository/tree` - directory tree with author/date filtering
//! - `GET /repository/branch`, `GET /repository/branches`
//! - `POST /repositories`, `GET /repositories` - the registry

mod error;
mod git;
mod models;
mod routes;
mod store;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routes::AppState;
use store::RepoStore;

/// Contribution statistics and directory trees for remote git repositories
#[derive(Parser)]
#[command(name = "repo-insight")]
#[command(about = "Per-file contribution analytics over remote git repositories", long_about = None)]
struct Cli {
    /// Directory holding the repository registry and temporary working copies
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| std::env::temp_dir().join("repo-insight"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let store = RepoStore::open(&data_dir.join("registry.db"))
        .context("failed to open repository registry")?;
    let state = AppState {
        store: Arc::new(store),
        workspaces_root: data_dir.join("workspaces"),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, data_dir = %data_dir.display(), "repo-insight listening");

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
