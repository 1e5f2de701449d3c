//! Library reads and writes
//!
//! Reads go through the source pool and assemble each library row with its
//! track location and cues. Writes take the target transaction's connection
//! and return the identifier SQLite assigned, which the caller threads into
//! the next dependent insert. Crate queries serve the playlist import.

use crate::remap::LocationPaths;
use mxm_common::db::{
    quote_ident, ColumnValues, Directory, SchemaIntrospector, SourceCue, SourceLocation,
    SourceTrack, SqlValue, CRATES_TABLE, CRATE_TRACKS_TABLE, CUES_TABLE, DIRECTORIES_TABLE,
    LIBRARY_TABLE, TRACK_LOCATIONS_TABLE,
};
use mxm_common::{Error, Result};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// List every directory row
pub async fn load_directories(pool: &SqlitePool) -> Result<Vec<Directory>> {
    let rows: Vec<(Option<String>,)> = sqlx::query_as(&format!(
        "SELECT directory FROM {}",
        quote_ident(DIRECTORIES_TABLE)
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(directory,)| Directory { directory })
        .collect())
}

/// List every library row with its track location and cues
///
/// Tracks keep the source's natural row order. A track whose location
/// reference is NULL or points at a missing row gets `location: None`.
pub async fn load_tracks(pool: &SqlitePool) -> Result<Vec<SourceTrack>> {
    let locations = load_locations(pool).await?;
    let mut cues = load_cues(pool).await?;

    let rows = sqlx::query(&format!("SELECT * FROM {}", quote_ident(LIBRARY_TABLE)))
        .fetch_all(pool)
        .await?;

    let mut tracks = Vec::with_capacity(rows.len());
    let mut location_users: HashMap<i64, usize> = HashMap::new();
    for (position, row) in rows.iter().enumerate() {
        let mut values = ColumnValues::from_row(row)?;
        let id = values.take("id").and_then(|v| v.as_integer());
        let location_id = values.take("location").and_then(|v| v.as_integer());

        // Looked up, not removed, so every row pointing at a location sees it
        let location = location_id.and_then(|loc_id| locations.get(&loc_id).cloned());
        if let Some(loc) = &location {
            *location_users.entry(loc.id).or_default() += 1;
        }

        tracks.push(SourceTrack {
            position,
            id,
            location_id,
            artist: values.get("artist").and_then(SqlValue::as_text),
            title: values.get("title").and_then(SqlValue::as_text),
            values,
            location,
            cues: id.and_then(|id| cues.remove(&id)).unwrap_or_default(),
        });
    }

    // Target locations are unique by path, so a shared one fails the merge
    for (loc_id, users) in location_users.iter().filter(|(_, users)| **users > 1) {
        warn!(
            "Track location {} is used by {} library rows; merging it will violate the unique location",
            loc_id, users
        );
    }

    if !cues.is_empty() {
        let orphaned: usize = cues.values().map(Vec::len).sum();
        debug!("{} cues belong to no library row and are not merged", orphaned);
    }

    Ok(tracks)
}

async fn load_locations(pool: &SqlitePool) -> Result<HashMap<i64, SourceLocation>> {
    let rows = sqlx::query(&format!(
        "SELECT * FROM {}",
        quote_ident(TRACK_LOCATIONS_TABLE)
    ))
    .fetch_all(pool)
    .await?;

    let mut locations = HashMap::with_capacity(rows.len());
    for row in &rows {
        let mut values = ColumnValues::from_row(row)?;
        let Some(id) = values.take("id").and_then(|v| v.as_integer()) else {
            continue;
        };
        let location = values.take("location").and_then(|v| v.as_text());
        let directory = values.take("directory").and_then(|v| v.as_text());
        locations.insert(
            id,
            SourceLocation {
                id,
                location,
                directory,
                values,
            },
        );
    }
    Ok(locations)
}

async fn load_cues(pool: &SqlitePool) -> Result<HashMap<i64, Vec<SourceCue>>> {
    let rows = sqlx::query(&format!("SELECT * FROM {}", quote_ident(CUES_TABLE)))
        .fetch_all(pool)
        .await?;

    let mut by_track: HashMap<i64, Vec<SourceCue>> = HashMap::new();
    for row in &rows {
        let mut values = ColumnValues::from_row(row)?;
        let id = values.take("id").and_then(|v| v.as_integer());
        let track_id = values.take("track_id").and_then(|v| v.as_integer());
        let (Some(id), Some(track_id)) = (id, track_id) else {
            continue;
        };
        by_track
            .entry(track_id)
            .or_default()
            .push(SourceCue { id, values });
    }
    Ok(by_track)
}

/// Column names of the target relations the merge writes
///
/// Read inside the merge transaction; source columns not listed here are
/// not written.
#[derive(Debug, Clone, Default)]
pub struct TargetColumns {
    tables: HashMap<&'static str, HashSet<String>>,
}

impl TargetColumns {
    pub async fn introspect(conn: &mut SqliteConnection) -> Result<Self> {
        let mut tables = HashMap::new();
        for table in [DIRECTORIES_TABLE, TRACK_LOCATIONS_TABLE, LIBRARY_TABLE, CUES_TABLE] {
            let columns = SchemaIntrospector::table_columns(conn, table).await?;
            if columns.is_empty() {
                return Err(Error::NotFound(format!(
                    "table \"{}\" in target library",
                    table
                )));
            }
            tables.insert(table, columns.into_iter().map(|c| c.name).collect());
        }
        Ok(Self { tables })
    }

    pub fn contains(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    /// Names from `names` that `table` lacks
    pub fn missing<'a>(&self, table: &str, names: impl Iterator<Item = &'a str>) -> Vec<String> {
        names
            .filter(|name| !self.contains(table, name))
            .map(str::to_string)
            .collect()
    }

    fn writable<'v>(&self, table: &str, values: &'v ColumnValues) -> Vec<(&'v str, &'v SqlValue)> {
        values
            .iter()
            .filter(|(name, _)| self.contains(table, name))
            .collect()
    }
}

/// Insert one directory row
pub async fn insert_directory(conn: &mut SqliteConnection, directory: &str) -> Result<()> {
    let value = SqlValue::Text(directory.to_string());
    insert_row(conn, DIRECTORIES_TABLE, &[("directory", &value)]).await?;
    Ok(())
}

/// Insert a track location with remapped paths; returns the new id
pub async fn insert_location(
    conn: &mut SqliteConnection,
    columns: &TargetColumns,
    paths: &LocationPaths,
    values: &ColumnValues,
) -> Result<i64> {
    let location = SqlValue::Text(paths.location.clone());
    let directory = SqlValue::Text(paths.directory.clone());

    let mut row = vec![("location", &location), ("directory", &directory)];
    row.extend(columns.writable(TRACK_LOCATIONS_TABLE, values));
    insert_row(conn, TRACK_LOCATIONS_TABLE, &row).await
}

/// Insert a library row pointing at `location_id`; returns the new id
pub async fn insert_track(
    conn: &mut SqliteConnection,
    columns: &TargetColumns,
    location_id: i64,
    values: &ColumnValues,
) -> Result<i64> {
    let location = SqlValue::Integer(location_id);

    let mut row = columns.writable(LIBRARY_TABLE, values);
    row.push(("location", &location));
    insert_row(conn, LIBRARY_TABLE, &row).await
}

/// Insert a cue belonging to `track_id`; returns the new id
pub async fn insert_cue(
    conn: &mut SqliteConnection,
    columns: &TargetColumns,
    track_id: i64,
    values: &ColumnValues,
) -> Result<i64> {
    let track = SqlValue::Integer(track_id);

    let mut row = vec![("track_id", &track)];
    row.extend(columns.writable(CUES_TABLE, values));
    insert_row(conn, CUES_TABLE, &row).await
}

async fn insert_row(
    conn: &mut SqliteConnection,
    table: &str,
    row: &[(&str, &SqlValue)],
) -> Result<i64> {
    let sql = if row.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    } else {
        let names: Vec<String> = row.iter().map(|(name, _)| quote_ident(name)).collect();
        let placeholders = vec!["?"; row.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names.join(", "),
            placeholders
        )
    };

    let mut query = sqlx::query(&sql);
    for (_, value) in row {
        query = bind_value(query, value);
    }

    let result = query.execute(&mut *conn).await?;
    Ok(result.last_insert_rowid())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

/// Id of the crate called `name`, creating it if needed
///
/// The flag is true when the crate was created.
pub async fn find_or_create_crate(conn: &mut SqliteConnection, name: &str) -> Result<(i64, bool)> {
    let existing: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE name = ?",
        quote_ident(CRATES_TABLE)
    ))
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        debug!("Found crate \"{}\" with id {}", name, id);
        return Ok((id, false));
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {} (name) VALUES (?)",
        quote_ident(CRATES_TABLE)
    ))
    .bind(name)
    .execute(&mut *conn)
    .await?;
    let id = result.last_insert_rowid();
    debug!("Created crate \"{}\" with id {}", name, id);
    Ok((id, true))
}

/// Remove every track from a crate; returns how many were removed
pub async fn clear_crate_tracks(conn: &mut SqliteConnection, crate_id: i64) -> Result<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE crate_id = ?",
        quote_ident(CRATE_TRACKS_TABLE)
    ))
    .bind(crate_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Library id of the track stored at `location`
pub async fn find_track_by_location(
    conn: &mut SqliteConnection,
    location: &str,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar(&format!(
        "SELECT l.id FROM {} l JOIN {} t ON l.location = t.id WHERE t.location = ? LIMIT 1",
        quote_ident(LIBRARY_TABLE),
        quote_ident(TRACK_LOCATIONS_TABLE)
    ))
    .bind(location)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

/// Put a track in a crate; false if it was already there
pub async fn add_track_to_crate(
    conn: &mut SqliteConnection,
    crate_id: i64,
    track_id: i64,
) -> Result<bool> {
    let result = sqlx::query(&format!(
        "INSERT OR IGNORE INTO {} (crate_id, track_id) VALUES (?, ?)",
        quote_ident(CRATE_TRACKS_TABLE)
    ))
    .bind(crate_id)
    .bind(track_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
