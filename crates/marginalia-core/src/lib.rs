//! # marginalia-core
//!
//! Core note store for Marginalia, the desktop note-taking app.
//!
//! This crate is framework-agnostic and can be used by:
//! - The desktop shell (via commands)
//! - The quick capture popup
//! - The `marginalia` CLI
//!
//! ## Key Concepts
//!
//! - **Note**: A title/body record whose position in the collection is its
//!   display position
//! - **NoteRepository**: The session's canonical collection, with debounced
//!   persistence and single-slot undo for deletes
//! - **NoteStore**: Where the collection lives between sessions
//!   (`notes.json`, written atomically)

pub mod context;
pub mod event_bus;
pub mod export;
pub mod html;
pub mod paths;
pub mod persistence;
pub mod repository;

// Re-export commonly used types
pub use context::{ContextError, MarginaliaContext, MarginaliaContextBuilder};
pub use persistence::{AppSettings, ImportedNote, JsonNoteStore, Note, NoteStore, StoreError};
pub use repository::{NoteRepository, NoteUpdate, Partition, RepositoryConfig, SaveStatus};
