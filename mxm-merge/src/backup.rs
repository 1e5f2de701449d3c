//! Library backups
//!
//! A backup is a plain file copy named `<YYYY-MM-DD>-<unix seconds>.sqlite`
//! so backups sort by date and never collide within a second.

use chrono::{DateTime, Local};
use mxm_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Backup file path for a backup taken at `when`
pub fn backup_path(backups_dir: &Path, when: DateTime<Local>) -> PathBuf {
    backups_dir.join(format!(
        "{}-{}.sqlite",
        when.format("%Y-%m-%d"),
        when.timestamp()
    ))
}

/// Copy `database` into `backups_dir`, creating the folder if needed
///
/// Returns the path of the new backup.
pub fn backup_database(database: &Path, backups_dir: &Path) -> Result<PathBuf> {
    if !database.is_file() {
        return Err(Error::NotFound(format!(
            "Database not found: {}",
            database.display()
        )));
    }

    std::fs::create_dir_all(backups_dir)?;

    let destination = backup_path(backups_dir, Local::now());
    std::fs::copy(database, &destination)?;

    info!(
        "Backed up {} to {}",
        database.display(),
        destination.display()
    );
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_format() {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        let path = backup_path(Path::new("/tmp/backups"), when);
        assert_eq!(
            path,
            PathBuf::from(format!("/tmp/backups/2024-03-09-{}.sqlite", when.timestamp()))
        );
    }

    #[test]
    fn test_backup_copies_file() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("mixxxdb.sqlite");
        std::fs::write(&database, b"library bytes").unwrap();

        let backups = dir.path().join("backups");
        let copy = backup_database(&database, &backups).unwrap();

        assert!(copy.starts_with(&backups));
        assert_eq!(copy.extension().and_then(|e| e.to_str()), Some("sqlite"));
        assert_eq!(std::fs::read(&copy).unwrap(), b"library bytes");
    }

    #[test]
    fn test_backup_missing_database() {
        let dir = TempDir::new().unwrap();
        let result = backup_database(&dir.path().join("absent.sqlite"), dir.path());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
