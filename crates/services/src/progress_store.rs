use std::sync::Arc;

use pecs_core::model::{Catalog, PhaseId, PhaseInfo, PhaseStatus, UserId, UserProgress};
use storage::repository::KeyValueStore;

use crate::Clock;
use crate::records::{PROGRESS_KEY, read_json, write_json};

/// A phase paired with how it should be shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOverview {
    pub info: PhaseInfo,
    pub status: PhaseStatus,
}

/// Owns the persisted `UserProgress` record.
///
/// Reads never fail: anything that cannot be loaded is replaced by fresh
/// progress. Writes are last-write-wins.
#[derive(Clone)]
pub struct ProgressStore {
    clock: Clock,
    user_id: UserId,
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            user_id: UserId::default_user(),
            kv,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Fresh progress for this store's learner.
    #[must_use]
    pub fn default_progress(&self) -> UserProgress {
        UserProgress::new(self.user_id.clone(), self.clock.now())
    }

    /// Load the persisted record, or defaults when there is none usable.
    pub async fn load(&self) -> UserProgress {
        read_json(self.kv.as_ref(), PROGRESS_KEY)
            .await
            .unwrap_or_else(|| self.default_progress())
    }

    /// Overwrite the persisted record.
    pub async fn save(&self, progress: &UserProgress) {
        write_json(self.kv.as_ref(), PROGRESS_KEY, progress).await;
    }

    /// Persist and return fresh progress. Session history is left as is.
    pub async fn reset(&self) -> UserProgress {
        let progress = self.default_progress();
        self.save(&progress).await;
        tracing::info!(user = %self.user_id, "progress reset");
        progress
    }

    pub async fn phase_status(&self, phase: PhaseId) -> PhaseStatus {
        self.load().await.status_of(phase)
    }

    /// Every phase in the catalog with its unlock status.
    pub async fn phase_overview(&self, catalog: &Catalog) -> Vec<PhaseOverview> {
        let progress = self.load().await;
        catalog
            .phases()
            .iter()
            .map(|info| PhaseOverview {
                info: info.clone(),
                status: progress.status_of(info.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pecs_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryStore, StorageError};

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("unavailable".into()))
        }
    }

    fn phase(n: u8) -> PhaseId {
        PhaseId::new(n).unwrap()
    }

    #[tokio::test]
    async fn load_without_record_returns_defaults() {
        let store = ProgressStore::new(fixed_clock(), Arc::new(InMemoryStore::new()));
        let progress = store.load().await;
        assert_eq!(progress.current_phase(), PhaseId::FIRST);
        assert_eq!(progress.total_sessions(), 0);
        assert_eq!(progress.user_id().as_str(), "user1");
        assert_eq!(progress.last_activity(), fixed_now());
    }

    #[tokio::test]
    async fn save_then_load_observes_new_value() {
        let store = ProgressStore::new(fixed_clock(), Arc::new(InMemoryStore::new()));
        let mut progress = store.load().await;
        progress.mark_phase_completed(phase(1));
        store.save(&progress).await;
        assert_eq!(store.load().await, progress);
    }

    #[tokio::test]
    async fn malformed_json_falls_back_to_defaults() {
        let kv = InMemoryStore::new();
        kv.set("progress", "{not json").await.unwrap();
        let store = ProgressStore::new(fixed_clock(), Arc::new(kv));
        assert_eq!(store.load().await, store.default_progress());
    }

    #[tokio::test]
    async fn invalid_record_falls_back_to_defaults() {
        let kv = InMemoryStore::new();
        kv.set(
            "progress",
            r#"{"userId":"user1","currentPhase":9,"phasesCompleted":[],"totalSessions":0,"successRate":0,"lastActivity":"2023-11-14T22:13:20Z"}"#,
        )
        .await
        .unwrap();
        let store = ProgressStore::new(fixed_clock(), Arc::new(kv));
        assert_eq!(store.load().await.current_phase(), PhaseId::FIRST);
    }

    #[tokio::test]
    async fn unavailable_storage_is_treated_as_absent() {
        let store = ProgressStore::new(fixed_clock(), Arc::new(BrokenStore));
        let mut progress = store.load().await;
        progress.mark_phase_completed(phase(1));
        store.save(&progress).await;
        assert_eq!(store.load().await, store.default_progress());
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let store = ProgressStore::new(fixed_clock(), Arc::new(InMemoryStore::new()));
        let mut progress = store.load().await;
        progress.record_session_rate(80.0, fixed_now());
        progress.mark_phase_completed(phase(1));
        store.save(&progress).await;

        let reset = store.reset().await;

        assert_eq!(reset.current_phase(), PhaseId::FIRST);
        assert!(reset.phases_completed().is_empty());
        assert_eq!(reset.total_sessions(), 0);
        assert_eq!(reset.success_rate(), 0.0);
        assert_eq!(store.load().await, reset);
    }

    #[tokio::test]
    async fn overview_reports_each_phase() {
        let store = ProgressStore::new(fixed_clock(), Arc::new(InMemoryStore::new()));
        let mut progress = store.load().await;
        progress.mark_phase_completed(phase(1));
        progress.mark_phase_completed(phase(2));
        store.save(&progress).await;

        let overview = store.phase_overview(&Catalog::builtin()).await;
        let statuses: Vec<PhaseStatus> = overview.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                PhaseStatus::Completed,
                PhaseStatus::Completed,
                PhaseStatus::Current,
                PhaseStatus::Locked,
                PhaseStatus::Locked,
                PhaseStatus::Locked,
            ]
        );
        assert_eq!(store.phase_status(phase(4)).await, PhaseStatus::Locked);
    }
}
