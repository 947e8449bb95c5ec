//! MarginaliaContext - the per-process state shared by every interface.
//!
//! The desktop shell, the quick capture popup and the CLI all work on the
//! same repository, settings and event bus. Build one context at startup
//! and pass it by reference; call `shutdown` from the quit hook so edits
//! inside the debounce window reach the disk.
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │    MarginaliaContext     │
//!              ├──────────────────────────┤
//!              │  - NoteRepository        │
//!              │  - AppSettings           │
//!              │  - EventBus              │
//!              │  - data_dir              │
//!              └────────────┬─────────────┘
//!                           │
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐
//!   │ Main window │  │Quick capture│  │     CLI     │
//!   └─────────────┘  └─────────────┘  └─────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::event_bus::{EventBus, SETTINGS_CHANGED};
use crate::paths;
use crate::persistence::{
    load_settings, save_settings, AppSettings, JsonNoteStore, NoteStore, StoreError,
};
use crate::repository::{NoteRepository, RepositoryConfig, RepositoryError};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Configuration for building a MarginaliaContext.
#[derive(Default)]
pub struct MarginaliaContextBuilder {
    data_dir: Option<PathBuf>,
    store: Option<Arc<dyn NoteStore>>,
    event_bus: Option<Arc<EventBus>>,
    repository_config: Option<RepositoryConfig>,
}

impl MarginaliaContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory for `notes.json` and `settings.json`.
    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = Some(dir);
        self
    }

    /// Use a custom note store instead of `<data dir>/notes.json`.
    pub fn store(mut self, store: Arc<dyn NoteStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an existing EventBus.
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn repository_config(mut self, config: RepositoryConfig) -> Self {
        self.repository_config = Some(config);
        self
    }

    /// Load settings and open the repository. Needs a tokio runtime.
    pub fn build(self) -> Result<MarginaliaContext, ContextError> {
        let data_dir = match self.data_dir {
            Some(dir) => dir,
            None => paths::default_data_dir().map_err(ContextError::DataDir)?,
        };
        let event_bus = self.event_bus.unwrap_or_else(|| Arc::new(EventBus::new()));
        let store: Arc<dyn NoteStore> = match self.store {
            Some(store) => store,
            None => Arc::new(JsonNoteStore::in_dir(&data_dir)),
        };

        let repository = NoteRepository::open(
            store,
            Arc::clone(&event_bus),
            self.repository_config.unwrap_or_default(),
        )?;
        let settings = load_settings(&data_dir);

        log::info!("Using data directory {}", data_dir.display());

        Ok(MarginaliaContext {
            data_dir,
            event_bus,
            repository: Arc::new(repository),
            settings: RwLock::new(settings),
        })
    }
}

/// Shared state for every Marginalia interface.
pub struct MarginaliaContext {
    data_dir: PathBuf,
    event_bus: Arc<EventBus>,
    repository: Arc<NoteRepository>,
    settings: RwLock<AppSettings>,
}

impl MarginaliaContext {
    pub fn builder() -> MarginaliaContextBuilder {
        MarginaliaContextBuilder::new()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn repository(&self) -> &Arc<NoteRepository> {
        &self.repository
    }

    pub fn settings(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist new settings and broadcast them.
    ///
    /// The in-memory settings only change once the file is written.
    pub fn update_settings(&self, settings: AppSettings) -> Result<(), StoreError> {
        save_settings(&self.data_dir, &settings)?;
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings.clone();

        self.event_bus.emit(SETTINGS_CHANGED, &settings);
        Ok(())
    }

    /// Flush pending note changes. Call before the process exits.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        self.repository.shutdown()
    }
}
