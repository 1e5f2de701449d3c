//! mxm-merge library - merges one Mixxx library into another
//!
//! Tracks, their locations and cue points are copied from a source library
//! into a target library with file paths rewritten through a
//! [`ReplacementTable`]. The write happens in a single transaction.
//! Playlist folders can also be imported into crates.

pub mod backup;
pub mod files;
pub mod import;
pub mod merge;
pub mod playlist;
pub mod remap;
pub mod report;
pub mod store;

pub use backup::{backup_database, backup_path};
pub use files::{check_output, merge_files, FileMergeOptions, MergePaths};
pub use import::{import_playlists, CrateSummary, ImportOptions, ImportReport};
pub use merge::{
    collect_snapshot, merge_libraries, unmapped_directories, write_snapshot, MergeOptions,
    SourceSnapshot,
};
pub use playlist::{find_playlists, CrateMap, Playlist};
pub use remap::{parse_replacement_arg, LocationPaths, ReplacementRule, ReplacementTable};
pub use report::{MergeReport, SkipReason, SkippedTrack, TrackOutcome};
