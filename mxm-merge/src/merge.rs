//! Merge orchestration
//!
//! 1. Collect a snapshot of the source library (read-only, no transaction)
//! 2. Open one transaction on the target
//! 3. Insert remapped directories
//! 4. For each track: location, then track, then cues, each insert using the
//!    identifier the previous one was assigned
//! 5. Commit, or roll back on the first store error
//!
//! Source identifiers are never written to the target. A track without a
//! usable location is skipped whole and reported; anything else that fails
//! aborts the run and leaves the target as it was.

use crate::remap::ReplacementTable;
use crate::report::{MergeReport, SkipReason, SkippedTrack, TrackOutcome};
use crate::store::{self, TargetColumns};
use mxm_common::db::{
    Directory, SourceTrack, CUES_TABLE, LIBRARY_TABLE, TRACK_LOCATIONS_TABLE,
};
use mxm_common::Result;
use sqlx::{SqliteConnection, SqlitePool};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything read from the source library
///
/// Owning the snapshot means the source connection can be closed before the
/// write phase starts.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub directories: Vec<Directory>,
    pub tracks: Vec<SourceTrack>,
}

/// Merge behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Roll back instead of committing; the report is still produced
    pub dry_run: bool,
}

/// Read directories and tracks (with locations and cues) from the source
pub async fn collect_snapshot(source: &SqlitePool) -> Result<SourceSnapshot> {
    let directories = store::load_directories(source).await?;
    let tracks = store::load_tracks(source).await?;

    info!(
        "Collected {} directories and {} tracks from source",
        directories.len(),
        tracks.len()
    );

    Ok(SourceSnapshot {
        directories,
        tracks,
    })
}

/// Write a snapshot into the target inside a single transaction
pub async fn write_snapshot(
    target: &SqlitePool,
    snapshot: &SourceSnapshot,
    replacements: &ReplacementTable,
    options: &MergeOptions,
) -> Result<MergeReport> {
    let start = Instant::now();
    let mut tx = target.begin().await?;

    let mut report = match write_rows(&mut *tx, snapshot, replacements).await {
        Ok(report) => report,
        Err(e) => {
            error!("Merge failed, rolling back: {}", e);
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
        "Merged {} tracks ({} cues, {} skipped) and {} directories in {} ms",
        report.tracks_inserted,
        report.cues_inserted,
        report.skipped_count(),
        report.directories_inserted,
        start.elapsed().as_millis()
    );

    Ok(report)
}

/// Collect from `source` and write into `target`
pub async fn merge_libraries(
    source: &SqlitePool,
    target: &SqlitePool,
    replacements: &ReplacementTable,
    options: &MergeOptions,
) -> Result<MergeReport> {
    let snapshot = collect_snapshot(source).await?;
    write_snapshot(target, &snapshot, replacements, options).await
}

/// Source directories that no replacement rule matches
///
/// These are copied unchanged, which is usually a sign the table is
/// incomplete.
pub fn unmapped_directories<'a>(
    snapshot: &'a SourceSnapshot,
    replacements: &ReplacementTable,
) -> Vec<&'a str> {
    snapshot
        .directories
        .iter()
        .filter_map(|d| d.directory.as_deref())
        .filter(|d| replacements.matching_rule(d).is_none())
        .collect()
}

async fn write_rows(
    conn: &mut SqliteConnection,
    snapshot: &SourceSnapshot,
    replacements: &ReplacementTable,
) -> Result<MergeReport> {
    let columns = TargetColumns::introspect(conn).await?;
    let mut report = MergeReport::default();

    record_dropped_columns(&columns, snapshot, &mut report);

    for dir in &snapshot.directories {
        let Some(path) = dir.directory.as_deref() else {
            report.directories_dropped += 1;
            continue;
        };
        let remapped = replacements.apply(path);
        debug!("Merging directory \"{}\" as \"{}\"", path, remapped);
        store::insert_directory(conn, &remapped).await?;
        report.directories_inserted += 1;
    }

    for track in &snapshot.tracks {
        let outcome = merge_track(conn, &columns, track, replacements).await?;
        report.record(outcome);
    }

    Ok(report)
}

/// Merge one track: location, track, then cues
async fn merge_track(
    conn: &mut SqliteConnection,
    columns: &TargetColumns,
    track: &SourceTrack,
    replacements: &ReplacementTable,
) -> Result<TrackOutcome> {
    let Some(source_id) = track.id else {
        return Ok(skip(track, SkipReason::MissingId));
    };
    let Some(location) = &track.location else {
        if let Some(loc_id) = track.location_id {
            debug!("Track location {} does not exist in the source", loc_id);
        }
        return Ok(skip(track, SkipReason::MissingTrackLocation));
    };
    let paths = match replacements
        .apply_location(location.directory.as_deref(), location.location.as_deref())
    {
        Ok(paths) => paths,
        Err(reason) => return Ok(skip(track, reason)),
    };

    let location_id = store::insert_location(conn, columns, &paths, &location.values).await?;
    let track_id = store::insert_track(conn, columns, location_id, &track.values).await?;

    for cue in &track.cues {
        let cue_id = store::insert_cue(conn, columns, track_id, &cue.values).await?;
        debug!("Cue {} -> {}", cue.id, cue_id);
    }

    debug!(
        "Mapped \"{}\" (track {} -> {}, location {} -> {}, {} cues) to \"{}\"",
        track.display_name(),
        source_id,
        track_id,
        location.id,
        location_id,
        track.cues.len(),
        paths.location
    );

    Ok(TrackOutcome::Inserted {
        location_id,
        track_id,
        cues: track.cues.len(),
    })
}

fn skip(track: &SourceTrack, reason: SkipReason) -> TrackOutcome {
    warn!(
        "Skipping #{} \"{}\": {}",
        track.position,
        track.display_name(),
        reason
    );
    TrackOutcome::Skipped(SkippedTrack {
        position: track.position,
        source_id: track.id,
        artist: track.artist.clone(),
        title: track.title.clone(),
        reason,
    })
}

fn record_dropped_columns(
    columns: &TargetColumns,
    snapshot: &SourceSnapshot,
    report: &mut MergeReport,
) {
    let first_track = snapshot.tracks.first();
    let samples = [
        (
            TRACK_LOCATIONS_TABLE,
            snapshot
                .tracks
                .iter()
                .find_map(|t| t.location.as_ref())
                .map(|l| &l.values),
        ),
        (LIBRARY_TABLE, first_track.map(|t| &t.values)),
        (
            CUES_TABLE,
            snapshot
                .tracks
                .iter()
                .find_map(|t| t.cues.first())
                .map(|c| &c.values),
        ),
    ];

    for (table, values) in samples {
        let Some(values) = values else {
            continue;
        };
        let missing = columns.missing(table, values.names());
        if !missing.is_empty() {
            warn!(
                "Target {} lacks columns {:?}; their values are not merged",
                table, missing
            );
            report.dropped_columns.insert(table.to_string(), missing);
        }
    }
}
