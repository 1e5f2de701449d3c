//! Playlist import into crates
//!
//! Runs in one transaction on the library. For each playlist the target
//! crates are found or created by name; a crate is emptied the first time a
//! run touches it, so re-importing a folder replaces crate contents instead
//! of piling up. Entries are linked when their file exists and their path is
//! a known track location.

use crate::playlist::{entry_location, CrateMap, Playlist};
use crate::store;
use mxm_common::db::{
    SchemaIntrospector, CRATES_TABLE, CRATE_TRACKS_TABLE, LIBRARY_TABLE, TRACK_LOCATIONS_TABLE,
};
use mxm_common::{Error, Result};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Roll back instead of committing
    pub dry_run: bool,
}

/// What one import run did to a crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrateSummary {
    pub id: i64,
    pub name: String,
    pub created: bool,
    /// Tracks removed before linking
    pub cleared: u64,
    pub tracks_linked: usize,
}

/// Summary of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub playlists: usize,
    pub crates: Vec<CrateSummary>,
    /// Entries whose file does not exist
    pub missing_files: Vec<String>,
    /// Entries whose file exists but is not in the library
    pub unknown_tracks: Vec<String>,
    pub committed: bool,
}

impl ImportReport {
    pub fn tracks_linked(&self) -> usize {
        self.crates.iter().map(|c| c.tracks_linked).sum()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Playlists: {}", self.playlists)?;
        for summary in &self.crates {
            writeln!(
                f,
                "  crate \"{}\" ({}{}): {} tracks, {} removed first",
                summary.name,
                summary.id,
                if summary.created { ", new" } else { "" },
                summary.tracks_linked,
                summary.cleared
            )?;
        }
        writeln!(f, "Missing files: {}", self.missing_files.len())?;
        for location in &self.unknown_tracks {
            writeln!(f, "  not in library: {}", location)?;
        }
        if self.committed {
            write!(f, "Committed")
        } else {
            write!(f, "Dry run, nothing written")
        }
    }
}

/// Import `playlists` into crates of the library behind `pool`
pub async fn import_playlists(
    pool: &SqlitePool,
    playlists: &[Playlist],
    crate_map: &CrateMap,
    options: &ImportOptions,
) -> Result<ImportReport> {
    for table in [CRATES_TABLE, CRATE_TRACKS_TABLE, LIBRARY_TABLE, TRACK_LOCATIONS_TABLE] {
        if !SchemaIntrospector::table_exists(pool, table).await? {
            return Err(Error::NotFound(format!("table \"{}\" in library", table)));
        }
    }

    let mut tx = pool.begin().await?;

    let mut report = match link_playlists(&mut *tx, playlists, crate_map).await {
        Ok(report) => report,
        Err(e) => {
            error!("Import failed, rolling back: {}", e);
            if let Err(rollback_err) = tx.rollback().await {
                error!("Rollback failed: {}", rollback_err);
            }
            return Err(e);
        }
    };

    if options.dry_run {
        tx.rollback().await?;
        info!("Dry run complete, transaction rolled back");
    } else {
        tx.commit().await?;
        report.committed = true;
    }

    info!(
        "Imported {} playlists into {} crates ({} tracks, {} missing files, {} not in library)",
        report.playlists,
        report.crates.len(),
        report.tracks_linked(),
        report.missing_files.len(),
        report.unknown_tracks.len()
    );
    Ok(report)
}

async fn link_playlists(
    conn: &mut SqliteConnection,
    playlists: &[Playlist],
    crate_map: &CrateMap,
) -> Result<ImportReport> {
    let mut report = ImportReport {
        playlists: playlists.len(),
        ..ImportReport::default()
    };
    // Crate name -> index into report.crates; a crate is cleared only when first seen
    let mut seen: HashMap<String, usize> = HashMap::new();

    for playlist in playlists {
        let mut targets: Vec<usize> = Vec::new();
        for name in crate_map.crate_names(&playlist.name) {
            let index = match seen.get(&name) {
                Some(index) => *index,
                None => {
                    let (id, created) = store::find_or_create_crate(conn, &name).await?;
                    let cleared = store::clear_crate_tracks(conn, id).await?;
                    if cleared > 0 {
                        debug!("Cleared {} tracks from crate \"{}\"", cleared, name);
                    }
                    report.crates.push(CrateSummary {
                        id,
                        name: name.clone(),
                        created,
                        cleared,
                        tracks_linked: 0,
                    });
                    seen.insert(name, report.crates.len() - 1);
                    report.crates.len() - 1
                }
            };
            if !targets.contains(&index) {
                targets.push(index);
            }
        }

        info!(
            "Importing \"{}\" ({} entries) into {:?}",
            playlist.name,
            playlist.entries.len(),
            targets
                .iter()
                .map(|&i| report.crates[i].name.as_str())
                .collect::<Vec<_>>()
        );

        for entry in &playlist.entries {
            let location = entry_location(entry);
            if !entry.exists() {
                debug!("Skipping \"{}\": file does not exist", location);
                report.missing_files.push(location);
                continue;
            }
            let Some(track_id) = store::find_track_by_location(conn, &location).await? else {
                warn!(
                    "Could not find \"{}\" in the library; rescan it or check the path's case",
                    location
                );
                report.unknown_tracks.push(location);
                continue;
            };
            for &index in &targets {
                let summary = &mut report.crates[index];
                if store::add_track_to_crate(conn, summary.id, track_id).await? {
                    summary.tracks_linked += 1;
                }
            }
        }
    }

    Ok(report)
}
