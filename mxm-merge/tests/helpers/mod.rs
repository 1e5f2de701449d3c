//! Test helper utilities
//!
//! Builds throwaway Mixxx libraries in a temporary folder and seeds them
//! with directories, track locations, tracks and cues.

#![allow(dead_code)]

use anyhow::Result;
use mxm_common::db::create_library;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create an empty library file `name` inside `dir`
///
/// Foreign keys follow `foreign_keys`; sources that need a dangling
/// location reference are created with enforcement off.
pub async fn create_test_library(
    dir: &TempDir,
    name: &str,
    foreign_keys: bool,
) -> Result<(PathBuf, SqlitePool)> {
    let path = dir.path().join(name);
    let pool = create_library(&path, foreign_keys).await?;
    Ok((path, pool))
}

pub async fn add_directory(pool: &SqlitePool, directory: Option<&str>) -> Result<()> {
    sqlx::query("INSERT INTO directories (directory) VALUES (?)")
        .bind(directory)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert a track location; `filename` is derived from `location`
pub async fn add_location(
    pool: &SqlitePool,
    directory: Option<&str>,
    location: Option<&str>,
) -> Result<i64> {
    let filename = location.and_then(|l| l.rsplit('/').next());
    let result = sqlx::query(
        "INSERT INTO track_locations (location, filename, directory, filesize, fs_deleted, needs_verification)
         VALUES (?, ?, ?, 4096, 0, 0)",
    )
    .bind(location)
    .bind(filename)
    .bind(directory)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn add_track(
    pool: &SqlitePool,
    artist: Option<&str>,
    title: Option<&str>,
    location_id: Option<i64>,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO library (artist, title, album, location, bpm, duration, \"key\")
         VALUES (?, ?, 'Album', ?, 124.5, 301.25, 'Am')",
    )
    .bind(artist)
    .bind(title)
    .bind(location_id)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn add_cue(pool: &SqlitePool, track_id: i64, position: i64, label: &str) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO cues (track_id, type, position, length, hotcue, label) VALUES (?, 1, ?, 0, 0, ?)",
    )
    .bind(track_id)
    .bind(position)
    .bind(label)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Seed a directory plus one located track with `cue_count` cues
pub async fn add_located_track(
    pool: &SqlitePool,
    directory: &str,
    file: &str,
    artist: &str,
    title: &str,
    cue_count: i64,
) -> Result<i64> {
    let location = format!("{}/{}", directory, file);
    let location_id = add_location(pool, Some(directory), Some(&location)).await?;
    let track_id = add_track(pool, Some(artist), Some(title), Some(location_id)).await?;
    for i in 0..cue_count {
        add_cue(pool, track_id, 1000 * (i + 1), &format!("Cue {}", i + 1)).await?;
    }
    Ok(track_id)
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Row counts of directories, track_locations, library, cues
pub async fn table_counts(pool: &SqlitePool) -> Result<[i64; 4]> {
    Ok([
        count_rows(pool, "directories").await?,
        count_rows(pool, "track_locations").await?,
        count_rows(pool, "library").await?,
        count_rows(pool, "cues").await?,
    ])
}

/// Create a library file from raw statements, for layouts the declared
/// schema cannot produce
pub async fn create_raw_library(
    dir: &TempDir,
    name: &str,
    statements: &[&str],
) -> Result<SqlitePool> {
    let path = dir.path().join(name);
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path.display())).await?;
    for statement in statements {
        sqlx::query(statement).execute(&pool).await?;
    }
    Ok(pool)
}

/// Titles of the tracks in crate `name`, sorted
pub async fn crate_titles(pool: &SqlitePool, name: &str) -> Result<Vec<String>> {
    let titles = sqlx::query_scalar(
        "SELECT l.title FROM crate_tracks ct
         JOIN crates c ON ct.crate_id = c.id
         JOIN library l ON ct.track_id = l.id
         WHERE c.name = ?
         ORDER BY l.title",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;
    Ok(titles)
}
