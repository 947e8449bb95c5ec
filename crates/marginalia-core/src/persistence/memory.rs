//! In-process note store.
//!
//! Keeps the last saved snapshot in memory and counts writes, which makes
//! it the store of choice for tests and for embedders without a disk.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::notes::NoteStore;
use super::types::Note;
use super::StoreError;

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: Mutex<Option<Vec<Note>>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryNoteStore {
    /// Empty store: `load` reports no prior data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `notes`.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(Some(notes)),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved collection.
    pub fn snapshot(&self) -> Option<Vec<Note>> {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make subsequent `save` calls fail with an IO error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl NoteStore for MemoryNoteStore {
    fn load(&self) -> Option<Vec<Note>> {
        self.snapshot()
    }

    fn save(&self, notes: &[Note]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "writes disabled",
            )));
        }

        *self.notes.lock().unwrap_or_else(PoisonError::into_inner) = Some(notes.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
