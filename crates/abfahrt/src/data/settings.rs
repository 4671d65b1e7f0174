//! Application settings
//!
//! User preferences, persisted as a versioned JSON file with per-field
//! defaults so partial or older files keep loading.

use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings data file name
const SETTINGS_FILE: &str = "settings.json";

/// Settings file format version for migrations
const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,

    // === Appearance ===
    /// Theme preference
    #[serde(default)]
    pub theme: Theme,

    // === Backend ===
    /// Backend base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    // === Search ===
    /// Stations requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    // === Departures ===
    /// Departures window in minutes
    #[serde(default = "default_board_duration")]
    pub board_duration_min: u32,

    /// Seconds between board refreshes while a station is open
    #[serde(default = "default_board_refresh")]
    pub board_refresh_secs: u64,

    // === Radar ===
    /// Lookahead passed to the radar endpoint, seconds
    #[serde(default = "default_radar_duration")]
    pub radar_duration_secs: u32,

    /// Vehicle cap per sweep
    #[serde(default = "default_radar_results")]
    pub radar_results: u32,

    /// Seconds between sweeps while the radar is active
    #[serde(default = "default_radar_interval")]
    pub radar_interval_secs: u64,

    /// Backing file; in-memory only when `None`
    #[serde(skip)]
    path: Option<PathBuf>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_search_limit() -> u32 {
    crate::config::api::DEFAULT_SEARCH_LIMIT
}

fn default_board_duration() -> u32 {
    crate::config::api::DEFAULT_BOARD_DURATION_MIN
}

fn default_board_refresh() -> u64 {
    crate::config::ui::BOARD_REFRESH_SECS
}

fn default_radar_duration() -> u32 {
    crate::config::radar::DEFAULT_DURATION_SECS
}

fn default_radar_results() -> u32 {
    crate::config::radar::DEFAULT_RESULTS
}

fn default_radar_interval() -> u64 {
    crate::config::radar::SWEEP_INTERVAL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            theme: Theme::default(),
            api_base_url: None,
            search_limit: default_search_limit(),
            board_duration_min: default_board_duration(),
            board_refresh_secs: default_board_refresh(),
            radar_duration_secs: default_radar_duration(),
            radar_results: default_radar_results(),
            radar_interval_secs: default_radar_interval(),
            path: None,
        }
    }
}

impl Settings {
    /// Load settings from the default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(SETTINGS_FILE)?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = storage::load_from::<Settings>(path)?.unwrap_or_default();
        settings.path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Save to the backing file (no-op for in-memory settings)
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => storage::save_to(path, self),
            None => Ok(()),
        }
    }

    /// Save to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// Flip the theme between light and dark
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }
}

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the terminal's colors
    #[default]
    System,
    /// Always light
    Light,
    /// Always dark
    Dark,
}

impl Theme {
    /// Whether this theme prefers dark rendering
    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// The theme after a dark-mode toggle
    pub fn toggled(&self) -> Theme {
        if self.is_dark() {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}
