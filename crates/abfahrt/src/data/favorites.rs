//! Favorites management
//!
//! An ordered list of pinned stations, unique by station id, persisted as
//! a versioned JSON file.

use crate::data::storage;
use crate::data::types::FavoriteStation;
use crate::error::Result;
use crate::providers::types::Station;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Favorites data file name
const FAVORITES_FILE: &str = "favorites.json";

/// Favorites file format version for migrations
const FAVORITES_VERSION: u32 = 1;

/// On-disk file structure
#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    version: u32,
    stations: Vec<FavoriteStation>,
}

impl Default for FavoritesFile {
    fn default() -> Self {
        Self {
            version: FAVORITES_VERSION,
            stations: Vec::new(),
        }
    }
}

/// Pinned stations, in the order the user added them
pub struct Favorites {
    entries: Vec<FavoriteStation>,
    /// Whether there are unsaved changes
    dirty: bool,
    /// Backing file; in-memory only when `None`
    path: Option<PathBuf>,
}

impl Favorites {
    /// Create an empty in-memory list (no persistence)
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
            path: None,
        }
    }

    /// Load favorites from the default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(FAVORITES_FILE)?;
        Self::load_from(&path)
    }

    /// Load favorites from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = storage::load_from::<FavoritesFile>(path)?.unwrap_or_default();

        // Drop any duplicate ids a hand-edited file might contain; the
        // first occurrence wins, matching insertion order
        let mut seen = HashSet::new();
        let entries = file
            .stations
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();

        Ok(Self {
            entries,
            dirty: false,
            path: Some(path.to_path_buf()),
        })
    }

    /// Save to the backing file if there are unsaved changes
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save to a specific path if there are unsaved changes
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = FavoritesFile {
            version: FAVORITES_VERSION,
            stations: self.entries.clone(),
        };
        storage::save_to(path, &file)?;
        self.dirty = false;
        Ok(())
    }

    /// Check if there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pin a station. Returns `false` when its id is already pinned.
    pub fn add(&mut self, favorite: FavoriteStation) -> bool {
        if self.contains(&favorite.id) {
            return false;
        }
        self.entries.push(favorite);
        self.dirty = true;
        true
    }

    /// Unpin by station id
    pub fn remove(&mut self, id: &str) -> Option<FavoriteStation> {
        let index = self.entries.iter().position(|f| f.id == id)?;
        self.dirty = true;
        Some(self.entries.remove(index))
    }

    /// Toggle a station's pin. Returns whether it is pinned afterwards.
    pub fn toggle(&mut self, station: &Station) -> bool {
        if self.remove(&station.id).is_some() {
            false
        } else {
            self.add(FavoriteStation::from(station));
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|f| f.id == id)
    }

    pub fn all(&self) -> &[FavoriteStation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything. Returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        if removed > 0 {
            self.entries.clear();
            self.dirty = true;
        }
        removed
    }
}

impl Default for Favorites {
    fn default() -> Self {
        Self::new()
    }
}
