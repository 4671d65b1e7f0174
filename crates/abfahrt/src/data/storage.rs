//! JSON file persistence
//!
//! Missing and empty files read as "no data"; malformed files are an error
//! so a corrupted store is never silently overwritten with defaults.

use crate::config::app::NAME;
use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Per-user data directory for this application
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir().map(|p| p.join(NAME)).ok_or_else(|| {
        AppError::Storage(
            "could not determine the user data directory (is HOME set?)".to_string(),
        )
    })
}

/// Path of a named data file inside the data directory
pub fn data_path(filename: &str) -> Result<PathBuf> {
    Ok(data_dir()?.join(filename))
}

/// Load JSON data from a path
///
/// Returns `None` when the file does not exist or is empty.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content).map(Some).map_err(|e| {
        AppError::Storage(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Save JSON data to a path, creating parent directories as needed
pub fn save_to<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(data)
        .map_err(|e| AppError::Storage(format!("failed to serialize data: {e}")))?;

    fs::write(path, content).map_err(|e| {
        AppError::Storage(format!("failed to write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::env::temp_dir;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!("abfahrt_storage_test_{id}_{name}.json"))
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let data = Sample {
            name: "alexanderplatz".to_string(),
            count: 3,
        };

        save_to(&path, &data).unwrap();
        let loaded: Option<Sample> = load_from(&path).unwrap();
        assert_eq!(loaded, Some(data));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_nonexistent_is_none() {
        let path = temp_path("missing");
        let loaded: Option<Sample> = load_from(&path).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_load_empty_file_is_none() {
        let path = temp_path("empty");
        fs::write(&path, "  \n ").unwrap();

        let loaded: Option<Sample> = load_from(&path).unwrap();
        assert_eq!(loaded, None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let path = temp_path("malformed");
        fs::write(&path, "{ not json }").unwrap();

        let result: Result<Option<Sample>> = load_from(&path);
        assert!(result.is_err());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = temp_dir().join(format!("abfahrt_storage_test_dir_{id}"));
        let path = dir.join("nested").join("data.json");

        save_to(
            &path,
            &Sample {
                name: "nested".to_string(),
                count: 1,
            },
        )
        .unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_error_mentions_path() {
        let path = temp_path("error_path");
        fs::write(&path, "garbage").unwrap();

        let err = load_from::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("error_path"));

        let _ = fs::remove_file(&path);
    }
}
