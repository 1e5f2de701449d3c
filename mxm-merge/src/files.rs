//! Merging library files
//!
//! The target file is never opened for writing. It is copied to the output
//! path and the merge runs on the copy. The output is only left behind after
//! a committed merge; dry runs and failures remove it again.

use crate::merge::{collect_snapshot, unmapped_directories, write_snapshot, MergeOptions};
use crate::remap::ReplacementTable;
use crate::report::MergeReport;
use crate::SourceSnapshot;
use mxm_common::db::{connect_readonly, connect_target};
use mxm_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Library files taking part in a merge
#[derive(Debug, Clone)]
pub struct MergePaths {
    pub source: PathBuf,
    pub target: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileMergeOptions {
    pub merge: MergeOptions,
    /// Enforce foreign keys on the output
    pub foreign_keys: bool,
    /// Replace an existing output file
    pub force: bool,
}

/// Merge `paths.source` into a copy of `paths.target` written to `paths.output`
pub async fn merge_files(
    paths: &MergePaths,
    replacements: &ReplacementTable,
    options: &FileMergeOptions,
) -> Result<MergeReport> {
    check_output(&paths.target, &paths.output, options.force)?;

    // Read the source first so a bad source never leaves an output behind
    let source = connect_readonly(&paths.source).await?;
    let snapshot = collect_snapshot(&source).await;
    source.close().await;
    let snapshot = snapshot?;

    for directory in unmapped_directories(&snapshot, replacements) {
        warn!(
            "No replacement matches directory \"{}\"; it is copied unchanged",
            directory
        );
    }

    std::fs::copy(&paths.target, &paths.output)?;
    info!(
        "Copied {} to {}",
        paths.target.display(),
        paths.output.display()
    );

    let result = write_output(&paths.output, &snapshot, replacements, options).await;
    match &result {
        Ok(report) if report.committed => {
            info!("Merged library written to {}", paths.output.display());
        }
        _ => remove_output(&paths.output),
    }
    result
}

/// Refuse to write over the target, or over an existing file without `force`
pub fn check_output(target: &Path, output: &Path, force: bool) -> Result<()> {
    if !target.is_file() {
        return Err(Error::NotFound(format!(
            "Target library not found: {}",
            target.display()
        )));
    }
    if output.exists() {
        if std::fs::canonicalize(output)? == std::fs::canonicalize(target)? {
            return Err(Error::InvalidInput(format!(
                "Output must differ from target ({})",
                target.display()
            )));
        }
        if !force {
            return Err(Error::InvalidInput(format!(
                "Output {} already exists (use --force to overwrite)",
                output.display()
            )));
        }
    }
    Ok(())
}

async fn write_output(
    output: &Path,
    snapshot: &SourceSnapshot,
    replacements: &ReplacementTable,
    options: &FileMergeOptions,
) -> Result<MergeReport> {
    let pool = connect_target(output, options.foreign_keys).await?;
    let result = write_snapshot(&pool, snapshot, replacements, &options.merge).await;
    pool.close().await;
    result
}

fn remove_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => info!("Removed {}", output.display()),
        Err(e) => warn!("Could not remove {}: {}", output.display(), e),
    }
}
