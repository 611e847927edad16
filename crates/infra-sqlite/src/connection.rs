// SQLite Connection Setup

use crate::error::map_sqlx_error;
use qrmaster_core::error::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Create a file-backed pool with WAL mode, creating the file if missing
pub async fn create_pool(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}

/// Open a private in-memory engine (one connection, one database)
pub async fn open_memory_connection() -> Result<SqliteConnection> {
    SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(map_sqlx_error)?
        .connect()
        .await
        .map_err(map_sqlx_error)
}
