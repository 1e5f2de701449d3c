//! Merge outcomes and the run summary

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a source track was left out of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The library row has no usable id
    MissingId,
    /// The library row references no track location, or one that does not exist
    MissingTrackLocation,
    /// The track location has no directory
    MissingDirectory,
    /// The track location has no file path
    MissingLocation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::MissingId => "library row has no id",
            SkipReason::MissingTrackLocation => "no track location",
            SkipReason::MissingDirectory => "track location has no directory",
            SkipReason::MissingLocation => "track location has no path",
        };
        f.write_str(text)
    }
}

/// A source track that was not migrated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTrack {
    /// Zero-based position in source row order
    pub position: usize,
    /// Identifier in the source library, if the row had one
    pub source_id: Option<i64>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub reason: SkipReason,
}

/// Result of merging one source track
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Rows written, with the identifiers the target assigned
    Inserted {
        location_id: i64,
        track_id: i64,
        cues: usize,
    },
    Skipped(SkippedTrack),
}

/// Summary of one merge run
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub directories_inserted: usize,
    /// Source directory rows with a NULL path
    pub directories_dropped: usize,
    pub tracks_inserted: usize,
    pub cues_inserted: usize,
    pub skipped: Vec<SkippedTrack>,
    /// Source columns missing from the target, per relation
    pub dropped_columns: BTreeMap<String, Vec<String>>,
    /// False after a dry run
    pub committed: bool,
}

impl MergeReport {
    /// Fold one track outcome into the totals
    pub fn record(&mut self, outcome: TrackOutcome) {
        match outcome {
            TrackOutcome::Inserted { cues, .. } => {
                self.tracks_inserted += 1;
                self.cues_inserted += cues;
            }
            TrackOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Directories: {} inserted, {} dropped",
            self.directories_inserted, self.directories_dropped
        )?;
        writeln!(
            f,
            "Tracks: {} inserted, {} skipped",
            self.tracks_inserted,
            self.skipped.len()
        )?;
        writeln!(f, "Cues: {} inserted", self.cues_inserted)?;
        for skipped in &self.skipped {
            writeln!(
                f,
                "  skipped #{} \"{} - {}\": {}",
                skipped.position,
                skipped.artist.as_deref().unwrap_or("<N/A>"),
                skipped.title.as_deref().unwrap_or("<N/A>"),
                skipped.reason
            )?;
        }
        for (table, columns) in &self.dropped_columns {
            writeln!(f, "  {} columns not in target: {}", table, columns.join(", "))?;
        }
        if self.committed {
            write!(f, "Committed")
        } else {
            write!(f, "Dry run, nothing written")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_outcomes() {
        let mut report = MergeReport::default();
        report.record(TrackOutcome::Inserted {
            location_id: 10,
            track_id: 20,
            cues: 2,
        });
        report.record(TrackOutcome::Skipped(SkippedTrack {
            position: 1,
            source_id: Some(5),
            artist: None,
            title: Some("Untitled".to_string()),
            reason: SkipReason::MissingDirectory,
        }));

        assert_eq!(report.tracks_inserted, 1);
        assert_eq!(report.cues_inserted, 2);
        assert_eq!(report.skipped_count(), 1);

        let text = report.to_string();
        assert!(text.contains("skipped #1 \"<N/A> - Untitled\": track location has no directory"));
        assert!(text.ends_with("Dry run, nothing written"));
    }

    #[test]
    fn test_report_serializes_reason_snake_case() {
        let mut report = MergeReport::default();
        report.record(TrackOutcome::Skipped(SkippedTrack {
            position: 0,
            source_id: Some(1),
            artist: None,
            title: None,
            reason: SkipReason::MissingTrackLocation,
        }));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"][0]["reason"], "missing_track_location");
        assert_eq!(json["committed"], false);
    }
}
