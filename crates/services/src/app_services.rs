use std::sync::Arc;

use pecs_core::model::{Catalog, PracticeSettings};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::practice::PracticeService;
use crate::progress_store::ProgressStore;
use crate::sessions::SessionRecorder;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressStore>,
    recorder: Arc<SessionRecorder>,
    practice: Arc<PracticeService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: PracticeSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over a throwaway in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: PracticeSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: PracticeSettings) -> Self {
        let catalog = Arc::new(Catalog::builtin());
        let progress = ProgressStore::new(clock, Arc::clone(&storage.kv));
        let recorder = SessionRecorder::new(clock, Arc::clone(&storage.kv), progress.clone());
        let practice =
            PracticeService::new(clock, Arc::clone(&catalog), settings, recorder.clone());

        Self {
            catalog,
            progress: Arc::new(progress),
            recorder: Arc::new(recorder),
            practice: Arc::new(practice),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<SessionRecorder> {
        Arc::clone(&self.recorder)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }
}
