//! Persistence layer for notes and settings.
//!
//! # Overview
//!
//! This module handles all file I/O for Marginalia's persistent state:
//!
//! - **Notes** - The whole note collection as one JSON array
//! - **Settings** - App settings (quick capture popup)
//!
//! # File Locations
//!
//! ```text
//! <data dir>/                  (see `paths::default_data_dir`)
//! ├── notes.json
//! └── settings.json
//! ```
//!
//! # Design Principles
//!
//! ## Atomic Writes
//!
//! All save operations use write-then-rename to prevent corruption:
//!
//! 1. Write to `file.json.tmp`
//! 2. Rename to `file.json` (atomic on Unix)
//!
//! ## Reads Degrade
//!
//! A missing or unparsable file is treated as "no prior data". The caller
//! falls back to defaults instead of surfacing an error.

pub mod memory;
pub mod notes;
pub mod settings;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryNoteStore;
pub use notes::{JsonNoteStore, NoteStore, NOTES_FILE};
pub use settings::{load_settings, save_settings, SETTINGS_FILE};
pub use types::*;

/// Error type for write operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Temp sibling used for write-then-rename (`notes.json` -> `notes.json.tmp`).
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let temp_path = temp_path(path);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_path_is_sibling() {
        let path = Path::new("/data/notes.json");
        assert_eq!(temp_path(path), PathBuf::from("/data/notes.json.tmp"));
    }

    #[test]
    fn write_creates_missing_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("value.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: Vec<i32> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");

        write_json_atomic(&path, "first").unwrap();
        write_json_atomic(&path, "second").unwrap();

        assert!(!temp_path(&path).exists());
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "\"second\"");
    }

    #[test]
    fn failed_write_keeps_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");
        write_json_atomic(&path, "durable").unwrap();

        // A directory squatting on the temp path makes the write fail
        // before the rename is attempted.
        fs::create_dir(temp_path(&path)).unwrap();
        let result = write_json_atomic(&path, "lost");

        assert!(matches!(result, Err(StoreError::Io(_))));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "\"durable\"");
    }
}
