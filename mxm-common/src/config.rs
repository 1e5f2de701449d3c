//! Configuration loading and Mixxx folder resolution
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (applied by the binary on top of [`TomlConfig`])
//! 2. Config file named by `--config` or the `MXM_CONFIG` environment variable
//! 3. Platform config file (`<config dir>/mxm/config.toml`)
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MXM_CONFIG";

/// File name of the Mixxx library database
pub const MIXXX_DATABASE_FILE: &str = "mixxxdb.sqlite";

/// Merge configuration loaded from TOML
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Library to copy tracks from
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Library receiving the tracks (left untouched, copied to `output`)
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Where the merged library is written
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Enforce SQLite foreign keys on the output database
    ///
    /// Off by default: Mixxx declares `library.location` as referencing
    /// `track_locations(location)` while storing the location id.
    #[serde(default)]
    pub foreign_keys: bool,

    /// Ordered prefix replacements, first match wins
    #[serde(default)]
    pub replacements: Vec<ReplacementEntry>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One `[[replacements]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplacementEntry {
    pub from: String,
    pub to: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve and load configuration
    ///
    /// An explicitly named file (argument or environment) must load; the
    /// platform default file is only used when it exists.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the config file to load, if any
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file, only if present
    dirs::config_dir()
        .map(|d| d.join("mxm").join("config.toml"))
        .filter(|p| p.exists())
}

/// Get the OS-dependent Mixxx settings folder
pub fn default_mixxx_directory() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\Mixxx
        dirs::data_local_dir()
            .map(|d| d.join("Mixxx"))
            .ok_or_else(|| Error::Config("%LOCALAPPDATA% is not set".to_string()))
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|d| {
                d.join("Library/Containers/org.mixxx.mixxx/Data/Library/Application Support/Mixxx")
            })
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    } else {
        // ~/.mixxx
        dirs::home_dir()
            .map(|d| d.join(".mixxx"))
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    }
}

/// Get the default Mixxx library database path
pub fn default_mixxx_database() -> Result<PathBuf> {
    Ok(default_mixxx_directory()?.join(MIXXX_DATABASE_FILE))
}
