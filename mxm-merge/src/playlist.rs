//! Playlist folders and the crate map
//!
//! Every `*.m3u8` file in a folder is one playlist, named after its file
//! stem. By default a playlist fills one crate of the same name. A crate map
//! routes playlists into crates instead, so one playlist can feed several:
//!
//! ```yaml
//! prefix: "[Gigs] "
//! mappings:
//!   Warmup:
//!     - opening
//!     - lounge
//!   Peak:
//!     - lounge
//! ```
//!
//! Here `lounge.m3u8` fills both `[Gigs] Warmup` and `[Gigs] Peak`.

use mxm_common::{normalize_path, Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Crate map looked up in the playlist folder when none is named
pub const CRATE_MAP_FILE: &str = "mixxxkit.crates.yaml";

/// Prefix of imported crate names when the crate map sets none
pub const DEFAULT_CRATE_PREFIX: &str = "[MixxxKit] ";

const PLAYLIST_EXTENSION: &str = "m3u8";

#[derive(Debug, Deserialize)]
struct CrateMapFile {
    #[serde(default)]
    prefix: Option<String>,
    /// Crate name -> playlist names
    #[serde(default)]
    mappings: BTreeMap<String, Vec<String>>,
}

/// Which crates each playlist is imported into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateMap {
    prefix: String,
    /// Playlist name -> crate names (unprefixed)
    crates_by_playlist: BTreeMap<String, Vec<String>>,
}

impl Default for CrateMap {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CRATE_PREFIX.to_string(),
            crates_by_playlist: BTreeMap::new(),
        }
    }
}

impl CrateMap {
    /// Parse a crate map from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: CrateMapFile =
            serde_yaml::from_str(content).map_err(|e| Error::CrateMap(e.to_string()))?;

        let mut crates_by_playlist: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (crate_name, playlists) in file.mappings {
            for playlist in playlists {
                let crates = crates_by_playlist.entry(playlist).or_default();
                if !crates.contains(&crate_name) {
                    crates.push(crate_name.clone());
                }
            }
        }

        Ok(Self {
            prefix: file
                .prefix
                .unwrap_or_else(|| DEFAULT_CRATE_PREFIX.to_string()),
            crates_by_playlist,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::CrateMap(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
            .map_err(|e| Error::CrateMap(format!("{}: {}", path.display(), e)))
    }

    /// Load `explicit`, else the folder's crate map if present, else defaults
    pub fn resolve(folder: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = folder.join(CRATE_MAP_FILE);
        if default_path.is_file() {
            debug!("Using crate map {}", default_path.display());
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full crate names `playlist` is imported into
    pub fn crate_names(&self, playlist: &str) -> Vec<String> {
        match self.crates_by_playlist.get(playlist) {
            Some(crates) => crates
                .iter()
                .map(|name| format!("{}{}", self.prefix, name))
                .collect(),
            None => vec![format!("{}{}", self.prefix, playlist)],
        }
    }
}

/// One playlist file and the track paths it lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub path: PathBuf,
    /// Entries in file order; relative entries are resolved against the
    /// playlist's folder
    pub entries: Vec<PathBuf>,
}

impl Playlist {
    /// Build a playlist from the text of `path`
    ///
    /// Blank lines and `#` directives (`#EXTM3U`, `#EXTINF`) are ignored.
    pub fn parse(path: &Path, content: &str) -> Self {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let entries = content
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let entry = PathBuf::from(line);
                if entry.is_absolute() {
                    entry
                } else {
                    base.join(entry)
                }
            })
            .collect();

        Self {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &content))
    }
}

/// Library location string for a playlist entry
pub fn entry_location(entry: &Path) -> String {
    normalize_path(&entry.to_string_lossy())
}

/// Read every playlist in `folder`, sorted by file name
///
/// Unreadable playlist files are logged and left out.
pub fn find_playlists(folder: &Path) -> Result<Vec<Playlist>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PLAYLIST_EXTENSION))
        })
        .collect();
    paths.sort();

    let mut playlists = Vec::with_capacity(paths.len());
    for path in paths {
        match Playlist::read(&path) {
            Ok(playlist) => playlists.push(playlist),
            Err(e) => warn!("Could not read playlist {}: {}", path.display(), e),
        }
    }
    Ok(playlists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_crate_map_reverses_mappings() {
        let map = CrateMap::from_yaml_str(
            r#"
prefix: "[my] "
mappings:
  fruit:
    - apple
    - tomato
  vegetable:
    - leek
    - tomato
"#,
        )
        .unwrap();

        assert_eq!(map.prefix(), "[my] ");
        assert_eq!(map.crate_names("tomato"), vec!["[my] fruit", "[my] vegetable"]);
        assert_eq!(map.crate_names("leek"), vec!["[my] vegetable"]);
        // Unmapped playlists keep their own name
        assert_eq!(map.crate_names("bread"), vec!["[my] bread"]);
    }

    #[test]
    fn test_crate_map_default_prefix() {
        let map = CrateMap::from_yaml_str("mappings:\n  Peak:\n    - late\n").unwrap();
        assert_eq!(map.crate_names("late"), vec!["[MixxxKit] Peak"]);
        assert_eq!(CrateMap::default().crate_names("late"), vec!["[MixxxKit] late"]);
    }

    #[test]
    fn test_crate_map_rejects_bad_yaml() {
        assert!(matches!(
            CrateMap::from_yaml_str("mappings: [not, a, map]"),
            Err(Error::CrateMap(_))
        ));
    }

    #[test]
    fn test_parse_skips_directives_and_resolves_relative() {
        let content = "\u{feff}#EXTM3U\n#EXTINF:123,Artist - Song\n/music/a.mp3\n\n  sub/b.flac  \n";
        let playlist = Playlist::parse(Path::new("/lists/warmup.m3u8"), content);

        assert_eq!(playlist.name, "warmup");
        assert_eq!(
            playlist.entries,
            vec![PathBuf::from("/music/a.mp3"), PathBuf::from("/lists/sub/b.flac")]
        );
    }

    #[test]
    fn test_find_playlists_only_reads_m3u8() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.m3u8"), "/music/b.mp3\n").unwrap();
        std::fs::write(dir.path().join("a.M3U8"), "/music/a.mp3\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "/music/c.mp3\n").unwrap();
        std::fs::create_dir(dir.path().join("folder.m3u8")).unwrap();

        let playlists = find_playlists(dir.path()).unwrap();
        let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_prefers_explicit_then_folder_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(CrateMap::resolve(dir.path(), None).unwrap(), CrateMap::default());

        std::fs::write(dir.path().join(CRATE_MAP_FILE), "prefix: \"\"\n").unwrap();
        assert_eq!(
            CrateMap::resolve(dir.path(), None).unwrap().crate_names("x"),
            vec!["x"]
        );

        let explicit = dir.path().join("other.yaml");
        std::fs::write(&explicit, "prefix: \"[o] \"\n").unwrap();
        assert_eq!(
            CrateMap::resolve(dir.path(), Some(&explicit))
                .unwrap()
                .crate_names("x"),
            vec!["[o] x"]
        );

        assert!(CrateMap::resolve(dir.path(), Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
