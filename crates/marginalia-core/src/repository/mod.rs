//! NoteRepository - the canonical in-memory note collection.
//!
//! The repository owns the ordered list of notes for the whole session and
//! mediates every mutation. Persistence is debounced: each mutation
//! re-arms a single-slot timer and only the last write of a burst reaches
//! the store. Deletes are soft for a while so they can be undone.
//!
//! ## Lifecycle
//!
//! ```text
//! open(store) ──► create / update / delete / pin / reorder / import ──► shutdown()
//!                          │                                              │
//!                          └─ debounced save (save_delay) ─► store.save   └─ commit pending
//!                                                                            delete + flush
//! ```
//!
//! ## Soft delete
//!
//! ```text
//! Live ──delete──► Pending-delete ──undo_window / dismiss──► Committed
//!                        │
//!                        └──undo──► Live (at min(original index, len))
//! ```
//!
//! Only one note can be pending at a time. Deleting another note commits
//! the previous one first.
//!
//! All operations lock, mutate and return without touching the disk; the
//! timers run on the tokio runtime the repository was opened in.

mod seed;
pub mod timer;
pub mod view;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};

use crate::event_bus::{EventBus, NOTES_CHANGED, PENDING_DELETE, SAVE_STATUS};
use crate::persistence::{ImportedNote, Note, NoteStore, StoreError};

pub use seed::default_notes;
use timer::SingleSlotTimer;

/// Quiet period before a burst of edits is written.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(600);

/// How long a deleted note can be brought back.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(7);

/// Timing configuration for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub save_delay: Duration,
    pub undo_window: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            save_delay: DEFAULT_SAVE_DELAY,
            undo_window: DEFAULT_UNDO_WINDOW,
        }
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Note repository needs a tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// Persistence state observable by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SaveStatus {
    /// Everything is on disk.
    Idle,
    /// A write is scheduled or running.
    Saving,
    /// The last write failed. The next mutation or `flush` retries.
    Failed { message: String },
}

/// A deleted note that can still be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDelete {
    pub note: Note,
    /// Position the note had when it was deleted.
    pub index: usize,
}

/// Fields to change on a note. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NoteUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }
}

/// One side of the pinned-first split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Pinned,
    Unpinned,
}

struct State {
    notes: Vec<Note>,
    selected_id: Option<String>,
    search_query: String,
    /// The pending delete and the generation of the timer that expires it.
    pending_delete: Option<(PendingDelete, u64)>,
    delete_generation: u64,
    /// Bumped whenever a write is scheduled; a timer only writes if its
    /// generation is still current.
    save_generation: u64,
    save_status: SaveStatus,
    /// Changes not yet durably written.
    dirty: bool,
}

/// State shared with the timer tasks.
struct Shared {
    state: Mutex<State>,
    /// Held from snapshot until the save status is updated, so writes
    /// reach the store one at a time and in snapshot order.
    write_lock: Mutex<()>,
    store: Arc<dyn NoteStore>,
    events: Arc<EventBus>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_scheduled_save(&self, generation: u64) {
        let _writing = self.lock_writes();
        let snapshot = {
            let state = self.lock();
            if state.save_generation != generation {
                return;
            }
            state.notes.clone()
        };

        let result = self.store.save(&snapshot);
        self.finish_save(generation, &result);
    }

    fn finish_save(&self, generation: u64, result: &Result<(), StoreError>) {
        let status = {
            let mut state = self.lock();
            if state.save_generation != generation {
                // A newer write is already scheduled and owns the status.
                return;
            }
            state.save_status = match result {
                Ok(()) => {
                    state.dirty = false;
                    SaveStatus::Idle
                }
                Err(e) => {
                    log::error!("Failed to save notes: {}", e);
                    SaveStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            state.save_status.clone()
        };

        self.events.emit(SAVE_STATUS, &status);
    }

    fn expire_pending_delete(&self, generation: u64) {
        let expired = {
            let mut state = self.lock();
            match &state.pending_delete {
                Some((_, pending_generation)) if *pending_generation == generation => {
                    state.pending_delete.take()
                }
                _ => None,
            }
        };

        if let Some((pending, _)) = expired {
            log::debug!("Delete of note {} is now permanent", pending.note.id);
            self.events.emit(PENDING_DELETE, &Option::<PendingDelete>::None);
        }
    }
}

/// Reorder `notes` by `ids`. Unknown ids are skipped; notes not named keep
/// their relative order after the named ones.
fn apply_order<S: AsRef<str>>(notes: Vec<Note>, ids: &[S]) -> Vec<Note> {
    let mut remaining: Vec<Option<Note>> = notes.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for id in ids {
        let id = id.as_ref();
        let found = remaining
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|n| n.id == id));
        if let Some(note) = found.and_then(|pos| remaining[pos].take()) {
            ordered.push(note);
        }
    }

    ordered.extend(remaining.into_iter().flatten());
    ordered
}

/// Repair loaded data so the collection invariants hold.
fn sanitize_loaded(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::new();
    notes
        .into_iter()
        .filter_map(|mut note| {
            if !seen.insert(note.id.clone()) {
                log::warn!("Dropping note with duplicate id {}", note.id);
                return None;
            }
            if note.updated_at < note.created_at {
                note.updated_at = note.created_at;
            }
            Some(note)
        })
        .collect()
}

/// The session's note collection.
///
/// One instance per process; share it by reference (or `Arc`) with every
/// interface that renders or edits notes.
pub struct NoteRepository {
    shared: Arc<Shared>,
    config: RepositoryConfig,
    save_timer: SingleSlotTimer,
    delete_timer: SingleSlotTimer,
}

impl NoteRepository {
    /// Load the collection from `store`, seeding defaults on first run.
    ///
    /// Must be called from within a tokio runtime; the save and undo
    /// timers are spawned on it.
    pub fn open(
        store: Arc<dyn NoteStore>,
        events: Arc<EventBus>,
        config: RepositoryConfig,
    ) -> Result<Self, RepositoryError> {
        let runtime = Handle::try_current()?;

        let notes = match store.load() {
            Some(notes) => sanitize_loaded(notes),
            None => {
                log::info!("No saved notes, starting from the default collection");
                default_notes()
            }
        };
        log::info!("Opened note repository with {} notes", notes.len());

        let state = State {
            selected_id: notes.first().map(|n| n.id.clone()),
            notes,
            search_query: String::new(),
            pending_delete: None,
            delete_generation: 0,
            save_generation: 0,
            save_status: SaveStatus::Idle,
            dirty: false,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                write_lock: Mutex::new(()),
                store,
                events,
            }),
            config,
            save_timer: SingleSlotTimer::new(runtime.clone()),
            delete_timer: SingleSlotTimer::new(runtime),
        })
    }

    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.lock()
    }

    /// Announce a mutation and (re)arm the debounced write.
    fn schedule_save(&self) {
        let (generation, count, status_changed) = {
            let mut state = self.lock();
            state.save_generation += 1;
            state.dirty = true;
            let status_changed = state.save_status != SaveStatus::Saving;
            state.save_status = SaveStatus::Saving;
            (state.save_generation, state.notes.len(), status_changed)
        };

        self.shared
            .events
            .emit(NOTES_CHANGED, &serde_json::json!({ "count": count }));
        if status_changed {
            self.shared.events.emit(SAVE_STATUS, &SaveStatus::Saving);
        }

        let shared = Arc::clone(&self.shared);
        self.save_timer.schedule(self.config.save_delay, async move {
            shared.run_scheduled_save(generation);
        });
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// The full collection in stored (display) order.
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.lock().notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().notes.is_empty()
    }

    /// Notes matching `query`, pinned first. Never mutates.
    pub fn filtered_view(&self, query: &str) -> Vec<Note> {
        view::filtered_view(&self.lock().notes, query)
    }

    /// `filtered_view` of the current search query.
    pub fn visible_notes(&self) -> Vec<Note> {
        let state = self.lock();
        view::filtered_view(&state.notes, &state.search_query)
    }

    pub fn search_query(&self) -> String {
        self.lock().search_query.clone()
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.lock().search_query = query.into();
    }

    pub fn selected_id(&self) -> Option<String> {
        self.lock().selected_id.clone()
    }

    pub fn selected_note(&self) -> Option<Note> {
        let state = self.lock();
        let id = state.selected_id.as_deref()?;
        state.notes.iter().find(|n| n.id == id).cloned()
    }

    /// Select a note. Returns false (and keeps the selection) if absent.
    pub fn select(&self, id: &str) -> bool {
        let mut state = self.lock();
        if state.notes.iter().any(|n| n.id == id) {
            state.selected_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.lock()
            .pending_delete
            .as_ref()
            .map(|(pending, _)| pending.clone())
    }

    pub fn save_status(&self) -> SaveStatus {
        self.lock().save_status.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.save_status() == SaveStatus::Saving
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Insert an empty note at the top, select it and clear the search.
    pub fn create(&self) -> Note {
        let note = Note::empty();
        {
            let mut state = self.lock();
            state.notes.insert(0, note.clone());
            state.selected_id = Some(note.id.clone());
            state.search_query.clear();
        }

        log::debug!("Created note {}", note.id);
        self.schedule_save();
        note
    }

    /// Apply `changes` to the note and refresh its `updated_at`.
    ///
    /// Returns false for an unknown id (a UI that raced a delete); a save
    /// is scheduled either way.
    pub fn update(&self, id: &str, changes: NoteUpdate) -> bool {
        let found = {
            let mut state = self.lock();
            match state.notes.iter_mut().find(|n| n.id == id) {
                Some(note) => {
                    if let Some(title) = changes.title {
                        note.title = title;
                    }
                    if let Some(body) = changes.body {
                        note.body = body;
                    }
                    note.touch();
                    true
                }
                None => false,
            }
        };

        self.schedule_save();
        found
    }

    /// Remove the note from the collection, keeping it restorable for the
    /// undo window. Commits any earlier pending delete.
    pub fn delete(&self, id: &str) -> bool {
        let (pending, generation) = {
            let mut state = self.lock();
            let Some(index) = state.notes.iter().position(|n| n.id == id) else {
                return false;
            };

            if let Some((previous, _)) = state.pending_delete.take() {
                log::debug!("Delete of note {} is now permanent", previous.note.id);
            }

            let note = state.notes.remove(index);
            if state.selected_id.as_deref() == Some(id) {
                state.selected_id = match state.notes.len() {
                    0 => None,
                    len => Some(state.notes[index.min(len - 1)].id.clone()),
                };
            }

            state.delete_generation += 1;
            let generation = state.delete_generation;
            let pending = PendingDelete { note, index };
            state.pending_delete = Some((pending.clone(), generation));
            (pending, generation)
        };

        log::debug!("Deleted note {} at index {}", pending.note.id, pending.index);
        self.shared.events.emit(PENDING_DELETE, &Some(&pending));

        let shared = Arc::clone(&self.shared);
        self.delete_timer.schedule(self.config.undo_window, async move {
            shared.expire_pending_delete(generation);
        });

        self.schedule_save();
        true
    }

    /// Restore the pending delete at `min(original index, len)` and select
    /// it. `None` if nothing is pending.
    pub fn undo_delete(&self) -> Option<Note> {
        let restored = {
            let mut state = self.lock();
            let (pending, _) = state.pending_delete.take()?;
            let index = pending.index.min(state.notes.len());
            state.selected_id = Some(pending.note.id.clone());
            state.notes.insert(index, pending.note.clone());
            pending.note
        };
        self.delete_timer.cancel();

        log::debug!("Restored note {}", restored.id);
        self.shared
            .events
            .emit(PENDING_DELETE, &Option::<PendingDelete>::None);
        self.schedule_save();
        Some(restored)
    }

    /// Make the pending delete permanent now.
    pub fn dismiss_delete(&self) -> bool {
        let dismissed = self.lock().pending_delete.take();
        self.delete_timer.cancel();

        match dismissed {
            Some((pending, _)) => {
                log::debug!("Delete of note {} is now permanent", pending.note.id);
                self.shared
                    .events
                    .emit(PENDING_DELETE, &Option::<PendingDelete>::None);
                true
            }
            None => false,
        }
    }

    /// Flip the pin flag. Returns the new value, `None` for an unknown id.
    pub fn toggle_pin(&self, id: &str) -> Option<bool> {
        let pinned = {
            let mut state = self.lock();
            state.notes.iter_mut().find(|n| n.id == id).map(|note| {
                let pinned = !note.is_pinned();
                note.pinned = Some(pinned);
                pinned
            })
        };

        self.schedule_save();
        pinned
    }

    /// Replace the collection order with `ids`.
    ///
    /// Unknown ids are ignored and notes missing from `ids` keep their
    /// relative order at the end, so the set of notes never changes.
    pub fn reorder<S: AsRef<str>>(&self, ids: &[S]) {
        {
            let mut state = self.lock();
            let notes = std::mem::take(&mut state.notes);
            state.notes = apply_order(notes, ids);
        }

        self.schedule_save();
    }

    /// Reorder one partition and recombine pinned-first. The other
    /// partition keeps its members and order.
    pub fn reorder_partition<S: AsRef<str>>(&self, partition: Partition, ids: &[S]) {
        {
            let mut state = self.lock();
            let (pinned, unpinned): (Vec<Note>, Vec<Note>) = std::mem::take(&mut state.notes)
                .into_iter()
                .partition(|n| n.is_pinned());

            let (pinned, unpinned) = match partition {
                Partition::Pinned => (apply_order(pinned, ids), unpinned),
                Partition::Unpinned => (pinned, apply_order(unpinned, ids)),
            };
            state.notes = pinned.into_iter().chain(unpinned).collect();
        }

        self.schedule_save();
    }

    /// Add imported notes ahead of the existing ones, in input order, with
    /// a single write for the whole batch.
    pub fn import_batch(&self, entries: Vec<ImportedNote>) -> Vec<Note> {
        if entries.is_empty() {
            return Vec::new();
        }

        let imported: Vec<Note> = entries
            .into_iter()
            .map(|entry| Note::new(entry.title, entry.body))
            .collect();
        {
            let mut state = self.lock();
            state.selected_id = imported.first().map(|n| n.id.clone());
            state.notes.splice(0..0, imported.iter().cloned());
        }

        log::info!("Imported {} notes", imported.len());
        self.schedule_save();
        imported
    }

    /// Quick capture: add a note at the top and write immediately instead
    /// of waiting for the debounce.
    pub fn capture(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Note, StoreError> {
        let note = Note::new(title, body);
        let count = {
            let mut state = self.lock();
            state.notes.insert(0, note.clone());
            state.dirty = true;
            state.notes.len()
        };

        log::info!("Captured note {}", note.id);
        self.shared
            .events
            .emit(NOTES_CHANGED, &serde_json::json!({ "count": count }));
        self.flush()?;
        Ok(note)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Write unsaved changes now, cancelling the debounced write.
    ///
    /// Also retries after a failed write. Does nothing when clean.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.save_timer.cancel();

        // Waits for a scheduled write that is already running.
        let _writing = self.shared.lock_writes();
        let (snapshot, generation) = {
            let mut state = self.lock();
            if !state.dirty {
                return Ok(());
            }
            state.save_generation += 1;
            (state.notes.clone(), state.save_generation)
        };

        let result = self.shared.store.save(&snapshot);
        self.shared.finish_save(generation, &result);
        result
    }

    /// Commit any pending delete and flush. Call from the shutdown hook.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        self.dismiss_delete();
        let result = self.flush();
        log::info!("Note repository shut down");
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================
