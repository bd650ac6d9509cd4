//! SQLite pool setup.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::config::{Config, DbConfig};

fn connect_options(db: &DbConfig) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(db.busy_timeout_ms))
}

/// Open the pool, creating the database file and its directory on first use.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db = &config.db;

    if let Some(dir) = db.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory: {}", dir.display()))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(db.max_connections)
        .connect_with(connect_options(db))
        .await
        .with_context(|| format!("Failed to open database: {}", db.path.display()))?;

    tracing::debug!(
        path = %db.path.display(),
        max_connections = db.max_connections,
        "opened database pool"
    );

    Ok(pool)
}
