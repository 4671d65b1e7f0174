//! Search history
//!
//! Recent station queries, most-recent-first, capped and deduplicated
//! case-insensitively, persisted as a versioned JSON file.

use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// History data file name
const HISTORY_FILE: &str = "search_history.json";

/// History file format version for migrations
const HISTORY_VERSION: u32 = 1;

/// Maximum number of entries kept
const MAX_ENTRIES: usize = 10;

/// Shortest query worth remembering
const MIN_QUERY_LEN: usize = 2;

/// On-disk file structure
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    queries: Vec<String>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            version: HISTORY_VERSION,
            queries: Vec::new(),
        }
    }
}

/// Recent search queries, most recent first
pub struct SearchHistory {
    entries: Vec<String>,
    dirty: bool,
    /// Backing file; in-memory only when `None`
    path: Option<PathBuf>,
}

impl SearchHistory {
    /// Create an empty in-memory history (no persistence)
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
            path: None,
        }
    }

    /// Load history from the default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(HISTORY_FILE)?;
        Self::load_from(&path)
    }

    /// Load history from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = storage::load_from::<HistoryFile>(path)?.unwrap_or_default();

        // Sanitize a hand-edited file the same way entries are recorded
        let mut history = Self {
            entries: Vec::new(),
            dirty: false,
            path: None,
        };
        for query in file.queries.iter().rev() {
            history.record(query);
        }
        history.dirty = false;
        history.path = Some(path.to_path_buf());
        Ok(history)
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
        let file = HistoryFile {
            version: HISTORY_VERSION,
            queries: self.entries.clone(),
        };
        storage::save_to(path, &file)?;
        self.dirty = false;
        Ok(())
    }

    /// Check if there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Remember a query
    ///
    /// The query is trimmed; queries shorter than two characters are
    /// ignored. An existing entry matching case-insensitively is replaced,
    /// the new spelling moves to the front, and the list is truncated to
    /// the cap. Returns whether anything changed.
    pub fn record(&mut self, query: &str) -> bool {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return false;
        }

        let lowered = trimmed.to_lowercase();
        self.entries.retain(|q| q.to_lowercase() != lowered);
        self.entries.insert(0, trimmed.to_string());
        self.entries.truncate(MAX_ENTRIES);
        self.dirty = true;
        true
    }

    /// Entries, most recent first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new()
    }
}
