//! Database connections
//!
//! Each library is opened through a single-connection pool: the source is
//! only ever read, and the target must be owned by one merge transaction at
//! a time.

use crate::db::table_schemas::create_library_schema;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Connect to a library with read-only mode
///
/// Uses SQLite `mode=ro` so the source library cannot be modified.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!("Opened {} (read-only)", db_path.display());
    Ok(pool)
}

/// Connect to an existing library for writing
///
/// `foreign_keys` toggles `PRAGMA foreign_keys` on the connection. It must
/// be set before any transaction starts; SQLite ignores the pragma inside one.
pub async fn connect_target(db_path: &Path, foreign_keys: bool) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .foreign_keys(foreign_keys);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!(
        "Opened {} (read-write, foreign keys {})",
        db_path.display(),
        if foreign_keys { "on" } else { "off" }
    );
    Ok(pool)
}

/// Create a new, empty library file with the library relations
pub async fn create_library(db_path: &Path, foreign_keys: bool) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(foreign_keys);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_library_schema(&pool).await?;

    info!("Initialized library: {}", db_path.display());
    Ok(pool)
}
