//! Application settings
//!
//! User preferences persisted as a single JSON file: theme, playback
//! defaults, and the download directory override. A missing file reads
//! as the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Settings-related errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the system preference
    Auto,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// UI theme
    #[serde(default)]
    pub theme: Theme,

    /// Default playback speed
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Default playback volume, 0-100
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Resume playback from the last saved position
    #[serde(default)]
    pub remember_position: bool,

    /// Start playback automatically when a recording opens
    #[serde(default)]
    pub autoplay: bool,

    /// Where downloads are written; `None` uses the system download dir
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_speed() -> f64 {
    1.0
}

fn default_volume() -> u8 {
    80
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            default_speed: default_speed(),
            default_volume: default_volume(),
            remember_position: false,
            autoplay: false,
            download_dir: None,
        }
    }
}

/// JSON-file-backed settings store
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load settings; a missing file yields the defaults
    pub fn load(&self) -> SettingsResult<AppSettings> {
        if !self.path.exists() {
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                // A corrupt file falls back to defaults rather than
                // locking the user out of the settings page.
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                Ok(AppSettings::default())
            }
        }
    }

    /// Persist settings
    pub fn save(&self, settings: &AppSettings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_initial_preferences() {
        let settings = AppSettings::default();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.default_speed, 1.0);
        assert_eq!(settings.default_volume, 80);
        assert!(!settings.remember_position);
        assert!(!settings.autoplay);
        assert!(settings.download_dir.is_none());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), AppSettings::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config").join("settings.json"));

        let settings = AppSettings {
            theme: Theme::Dark,
            default_speed: 1.5,
            default_volume: 40,
            remember_position: true,
            autoplay: true,
            download_dir: Some(dir.path().join("downloads")),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path);
        assert_eq!(store.load().unwrap(), AppSettings::default());
    }

    #[test]
    fn theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Auto).unwrap(), "\"auto\"");
    }
}
