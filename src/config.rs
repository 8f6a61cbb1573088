/// Application configuration, stored as JSON in the user's config directory:
/// - Linux: ~/.config/star-gallery/config.json
/// - macOS: ~/Library/Application Support/star-gallery/config.json
/// - Windows: %APPDATA%\star-gallery\config.json
///
/// A missing or unreadable file falls back to defaults.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GalleryError, Result};
use crate::view::LayoutMode;

const APP_DIR: &str = "star-gallery";
const CONFIG_FILENAME: &str = "config.json";
const DB_FILENAME: &str = "gallery.db";

/// Overrides the database location when set
pub const DB_ENV_VAR: &str = "STAR_GALLERY_DB";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Explicit database file; the platform data directory is used when absent
    pub database_path: Option<PathBuf>,
    /// Layout the gallery opens in
    pub default_layout: LayoutMode,
    /// `tracing` filter directive, `RUST_LOG` takes precedence
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            default_layout: LayoutMode::Grid,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Where the config file lives, if the platform has a config directory
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!("loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Database location: `STAR_GALLERY_DB`, then the config, then the data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(DB_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(GalleryError::NoDataDir)?;
        path.push(APP_DIR);
        path.push(DB_FILENAME);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);
        let config = Config {
            database_path: Some(dir.path().join("g.db")),
            default_layout: LayoutMode::List,
            log_filter: "debug".into(),
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, r#"{ "default_layout": "list" }"#).unwrap();

        let config = Config::load_from(&path);

        assert_eq!(config.default_layout, LayoutMode::List);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }
}
