//! Integration tests for merging library files through an output copy

mod helpers;

use helpers::*;
use mxm_common::db::connect_readonly;
use mxm_common::Error;
use mxm_merge::{merge_files, FileMergeOptions, MergeOptions, MergePaths, ReplacementTable};
use std::path::Path;
use tempfile::TempDir;

fn music_table() -> ReplacementTable {
    ReplacementTable::new([("/music", "/newmusic")]).unwrap()
}

fn paths(dir: &TempDir) -> MergePaths {
    MergePaths {
        source: dir.path().join("source.sqlite"),
        target: dir.path().join("target.sqlite"),
        output: dir.path().join("merged.sqlite"),
    }
}

fn options(dry_run: bool) -> FileMergeOptions {
    FileMergeOptions {
        merge: MergeOptions { dry_run },
        foreign_keys: true,
        force: false,
    }
}

/// Seed a source with one track and an empty target, both closed on return
async fn seed_libraries(dir: &TempDir) {
    let (_, source) = create_test_library(dir, "source.sqlite", true).await.unwrap();
    add_directory(&source, Some("/music")).await.unwrap();
    add_located_track(&source, "/music", "a.mp3", "Artist", "Song", 2)
        .await
        .unwrap();
    source.close().await;

    let (_, target) = create_test_library(dir, "target.sqlite", true).await.unwrap();
    target.close().await;
}

async fn counts_of(path: &Path) -> [i64; 4] {
    let pool = connect_readonly(path).await.unwrap();
    let counts = table_counts(&pool).await.unwrap();
    pool.close().await;
    counts
}

#[tokio::test]
async fn test_merge_writes_output_and_keeps_target() {
    let dir = TempDir::new().unwrap();
    seed_libraries(&dir).await;
    let paths = paths(&dir);

    let report = merge_files(&paths, &music_table(), &options(false))
        .await
        .unwrap();

    assert!(report.committed);
    assert_eq!(report.tracks_inserted, 1);
    assert_eq!(counts_of(&paths.output).await, [1, 1, 1, 2]);
    assert_eq!(counts_of(&paths.target).await, [0, 0, 0, 0]);
}

#[tokio::test]
async fn test_missing_source_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let (_, target) = create_test_library(&dir, "target.sqlite", true).await.unwrap();
    target.close().await;
    let paths = paths(&dir);

    let result = merge_files(&paths, &music_table(), &options(false)).await;

    assert!(result.is_err());
    assert!(!paths.output.exists());
}

#[tokio::test]
async fn test_dry_run_removes_output() {
    let dir = TempDir::new().unwrap();
    seed_libraries(&dir).await;
    let paths = paths(&dir);

    let report = merge_files(&paths, &music_table(), &options(true))
        .await
        .unwrap();

    assert!(!report.committed);
    assert_eq!(report.tracks_inserted, 1);
    assert!(!paths.output.exists());
    assert_eq!(counts_of(&paths.target).await, [0, 0, 0, 0]);
}

#[tokio::test]
async fn test_failed_merge_removes_output() {
    for dry_run in [true, false] {
        let dir = TempDir::new().unwrap();
        let (_, source) = create_test_library(&dir, "source.sqlite", true).await.unwrap();
        add_directory(&source, Some("/music")).await.unwrap();
        add_located_track(&source, "/music", "a.mp3", "Artist", "Song", 0)
            .await
            .unwrap();
        source.close().await;
        // The remapped directory already exists in the target
        let (_, target) = create_test_library(&dir, "target.sqlite", true).await.unwrap();
        add_directory(&target, Some("/newmusic")).await.unwrap();
        target.close().await;
        let paths = paths(&dir);

        let result = merge_files(&paths, &music_table(), &options(dry_run)).await;

        assert!(matches!(result, Err(Error::Database(_))), "got {:?}", result);
        assert!(!paths.output.exists(), "output left behind (dry_run={})", dry_run);
        assert_eq!(counts_of(&paths.target).await, [1, 0, 0, 0]);
    }
}

#[tokio::test]
async fn test_existing_output_needs_force() {
    let dir = TempDir::new().unwrap();
    seed_libraries(&dir).await;
    let paths = paths(&dir);
    std::fs::write(&paths.output, b"keep me").unwrap();

    let result = merge_files(&paths, &music_table(), &options(false)).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))), "got {:?}", result);
    assert_eq!(std::fs::read(&paths.output).unwrap(), b"keep me");

    let forced = FileMergeOptions {
        force: true,
        ..options(false)
    };
    let report = merge_files(&paths, &music_table(), &forced).await.unwrap();
    assert!(report.committed);
    assert_eq!(counts_of(&paths.output).await, [1, 1, 1, 2]);
}

#[tokio::test]
async fn test_output_must_differ_from_target() {
    let dir = TempDir::new().unwrap();
    seed_libraries(&dir).await;
    let paths = MergePaths {
        output: dir.path().join("target.sqlite"),
        ..paths(&dir)
    };

    let forced = FileMergeOptions {
        force: true,
        ..options(false)
    };
    let result = merge_files(&paths, &music_table(), &forced).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))), "got {:?}", result);
    assert_eq!(counts_of(&paths.target).await, [0, 0, 0, 0]);
}
