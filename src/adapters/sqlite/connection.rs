//! Opening the levelup store.
//!
//! Every document write is a short compare-and-swap, so a small WAL pool
//! with a busy timeout is enough for a CLI and its background tasks.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::DatabaseConfig;

const MEMORY_PATH: &str = ":memory:";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Database path is empty")]
    EmptyPath,
    #[error("Failed to create store directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open store: {0}")]
    Open(#[source] sqlx::Error),
}

/// Open the file-backed store named by `config`, creating it if needed.
///
/// A path of `:memory:` opens a private in-memory store instead.
pub async fn open_store(config: &DatabaseConfig) -> Result<SqlitePool, ConnectionError> {
    let path = config.path.trim();
    if path.is_empty() {
        return Err(ConnectionError::EmptyPath);
    }
    if path == MEMORY_PATH {
        return open_memory_store().await;
    }

    let path = Path::new(path);
    create_parent_dir(path)?;

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(ConnectionError::Open)?;

    debug!(path = %path.display(), max_connections = config.max_connections, "store opened");
    Ok(pool)
}

/// In-memory store on a single pinned connection.
///
/// Each new connection would see an empty database, so the one connection
/// is never recycled and the data lives exactly as long as the pool.
pub async fn open_memory_store() -> Result<SqlitePool, ConnectionError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(ConnectionError::Open)?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(ConnectionError::Open)
}

fn create_parent_dir(path: &Path) -> Result<(), ConnectionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| ConnectionError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
