//! Note collection persistence.
//!
//! The whole collection is one JSON array in `notes.json`. Reads never
//! fail: a missing file is the expected first-run state and a corrupt one
//! is treated the same way, so the repository falls back to seed notes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::Note;
use super::{write_json_atomic, StoreError};

/// File name of the note collection inside the data directory.
pub const NOTES_FILE: &str = "notes.json";

/// Backing storage for the full note collection.
///
/// Only the repository calls this, and it never overlaps two `save`s.
pub trait NoteStore: Send + Sync {
    /// Load the collection. `None` means there is no usable prior data.
    fn load(&self) -> Option<Vec<Note>>;

    /// Durably replace the stored collection.
    fn save(&self, notes: &[Note]) -> Result<(), StoreError>;
}

/// `NoteStore` backed by a JSON file, written via temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonNoteStore {
    path: PathBuf,
}

impl JsonNoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/notes.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(NOTES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NoteStore for JsonNoteStore {
    fn load(&self) -> Option<Vec<Note>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No notes file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Note>>(&contents) {
            Ok(notes) => Some(notes),
            Err(e) => {
                log::warn!("Ignoring unparsable {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, notes: &[Note]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, notes)
    }
}

// ============================================================================
// TESTS
// ============================================================================
