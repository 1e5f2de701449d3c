//! Mixxx library table schemas
//!
//! The relations the merge and the playlist import touch, declared the way
//! Mixxx lays them out. Only used to create fresh libraries; real Mixxx files carry their own
//! schema, which the merge reads at runtime instead of trusting these.
//!
//! Foreign keys here point at `id` columns. Mixxx itself declares
//! `library.location REFERENCES track_locations(location)`, which is why the
//! merge binary keeps enforcement off by default.

use crate::db::schema::{create_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::debug;

pub const DIRECTORIES_TABLE: &str = "directories";
pub const TRACK_LOCATIONS_TABLE: &str = "track_locations";
pub const LIBRARY_TABLE: &str = "library";
pub const CUES_TABLE: &str = "cues";
pub const CRATES_TABLE: &str = "crates";
pub const CRATE_TRACKS_TABLE: &str = "crate_tracks";

/// Watched library folders
pub struct DirectoriesTableSchema;

impl TableSchema for DirectoriesTableSchema {
    fn table_name() -> &'static str {
        DIRECTORIES_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::new("directory", "TEXT").unique()]
    }
}

/// Physical placement of audio files
pub struct TrackLocationsTableSchema;

impl TableSchema for TrackLocationsTableSchema {
    fn table_name() -> &'static str {
        TRACK_LOCATIONS_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("location", "varchar(512)").unique(),
            ColumnDefinition::new("filename", "varchar(512)"),
            ColumnDefinition::new("directory", "varchar(512)"),
            ColumnDefinition::new("filesize", "INTEGER"),
            ColumnDefinition::new("fs_deleted", "INTEGER"),
            ColumnDefinition::new("needs_verification", "INTEGER"),
        ]
    }
}

/// Library entries (tracks)
pub struct LibraryTableSchema;

impl TableSchema for LibraryTableSchema {
    fn table_name() -> &'static str {
        LIBRARY_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("artist", "varchar(64)"),
            ColumnDefinition::new("title", "varchar(64)"),
            ColumnDefinition::new("album", "varchar(64)"),
            ColumnDefinition::new("year", "varchar(16)"),
            ColumnDefinition::new("genre", "varchar(64)"),
            ColumnDefinition::new("tracknumber", "varchar(3)"),
            ColumnDefinition::new("location", "INTEGER")
                .references("track_locations(id)"),
            ColumnDefinition::new("comment", "varchar(256)"),
            ColumnDefinition::new("url", "varchar(256)"),
            ColumnDefinition::new("duration", "float"),
            ColumnDefinition::new("bitrate", "INTEGER"),
            ColumnDefinition::new("samplerate", "INTEGER"),
            ColumnDefinition::new("cuepoint", "INTEGER"),
            ColumnDefinition::new("bpm", "float"),
            ColumnDefinition::new("wavesummaryhex", "BLOB"),
            ColumnDefinition::new("channels", "INTEGER"),
            ColumnDefinition::new("datetime_added", "TIMESTAMP").default("CURRENT_TIMESTAMP"),
            ColumnDefinition::new("mixxx_deleted", "INTEGER"),
            ColumnDefinition::new("played", "INTEGER"),
            ColumnDefinition::new("header_parsed", "INTEGER").default("0"),
            ColumnDefinition::new("filetype", "varchar(8)").default("'?'"),
            ColumnDefinition::new("replaygain", "float").default("0"),
            ColumnDefinition::new("timesplayed", "INTEGER").default("0"),
            ColumnDefinition::new("rating", "INTEGER").default("0"),
            ColumnDefinition::new("key", "varchar(8)").default("''"),
            ColumnDefinition::new("beats", "BLOB"),
            ColumnDefinition::new("beats_version", "TEXT"),
            ColumnDefinition::new("composer", "varchar(64)").default("''"),
            ColumnDefinition::new("bpm_lock", "INTEGER").default("0"),
            ColumnDefinition::new("keys", "BLOB"),
            ColumnDefinition::new("grouping", "TEXT").default("''"),
            ColumnDefinition::new("album_artist", "TEXT").default("''"),
            ColumnDefinition::new("color", "INTEGER"),
            ColumnDefinition::new("last_played_at", "DATETIME").default("NULL"),
        ]
    }
}

/// Hot cues, loops and other in-track markers
pub struct CuesTableSchema;

impl TableSchema for CuesTableSchema {
    fn table_name() -> &'static str {
        CUES_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("track_id", "INTEGER")
                .not_null()
                .references("library(id)"),
            ColumnDefinition::new("type", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("position", "INTEGER").not_null().default("-1"),
            ColumnDefinition::new("length", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("hotcue", "INTEGER").not_null().default("-1"),
            ColumnDefinition::new("label", "TEXT").not_null().default("''"),
            ColumnDefinition::new("color", "INTEGER").not_null().default("4294901760"),
        ]
    }
}

/// Named track collections
pub struct CratesTableSchema;

impl TableSchema for CratesTableSchema {
    fn table_name() -> &'static str {
        CRATES_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("name", "varchar(48)").not_null().unique(),
            ColumnDefinition::new("count", "INTEGER").default("0"),
            ColumnDefinition::new("show", "INTEGER").default("1"),
            ColumnDefinition::new("locked", "INTEGER").default("0"),
            ColumnDefinition::new("autodj_source", "INTEGER").default("0"),
        ]
    }
}

/// Crate membership
pub struct CrateTracksTableSchema;

impl TableSchema for CrateTracksTableSchema {
    fn table_name() -> &'static str {
        CRATE_TRACKS_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("crate_id", "INTEGER")
                .not_null()
                .references("crates(id)"),
            ColumnDefinition::new("track_id", "INTEGER")
                .not_null()
                .references("library(id)"),
        ]
    }

    fn table_constraints() -> Vec<String> {
        vec!["UNIQUE (crate_id, track_id)".to_string()]
    }
}

/// Create the library relations the merge and the playlist import use
///
/// Idempotent: existing tables are left as they are.
pub async fn create_library_schema(pool: &SqlitePool) -> Result<()> {
    create_table::<DirectoriesTableSchema>(pool).await?;
    create_table::<TrackLocationsTableSchema>(pool).await?;
    create_table::<LibraryTableSchema>(pool).await?;
    create_table::<CuesTableSchema>(pool).await?;
    create_table::<CratesTableSchema>(pool).await?;
    create_table::<CrateTracksTableSchema>(pool).await?;

    debug!("Library schema ready");
    Ok(())
}
