use std::sync::Arc;

use pecs_core::model::{
    Action, ActionDraft, ActionId, PhaseId, Session, SessionId, UserProgress,
};
use storage::repository::KeyValueStore;

use crate::Clock;
use crate::error::SessionError;
use crate::progress_store::ProgressStore;
use crate::records::{SESSIONS_KEY, read_json_list, write_json};

/// Number of finished sessions kept in history.
pub const HISTORY_LIMIT: usize = 10;

/// Opens sessions, logs their actions and folds finished sessions into the
/// learner's progress.
#[derive(Clone)]
pub struct SessionRecorder {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    progress: ProgressStore,
}

impl SessionRecorder {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>, progress: ProgressStore) -> Self {
        Self {
            clock,
            kv,
            progress,
        }
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Open a session for `phase`. Nothing is persisted until it completes.
    #[must_use]
    pub fn begin(&self, phase: PhaseId) -> Session {
        let session = Session::begin(
            SessionId::generate(),
            self.progress.user_id().clone(),
            phase,
            self.clock.now(),
        );
        tracing::debug!(session = %session.id(), phase = %phase, "session started");
        session
    }

    /// Append an attempt, stamped with a fresh id and the current time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` if the session was closed.
    pub fn record<'s>(
        &self,
        session: &'s mut Session,
        draft: ActionDraft,
    ) -> Result<&'s Action, SessionError> {
        let action = Action::new(ActionId::generate(), draft, self.clock.now());
        session.push_action(action)
    }

    /// Close the session, fold it into progress and prepend it to history.
    ///
    /// Storage failures are logged and swallowed; the returned values reflect
    /// what would have been written.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` if the session was closed before.
    pub async fn complete(
        &self,
        mut session: Session,
        success: bool,
    ) -> Result<(Session, UserProgress), SessionError> {
        session.close(success, self.clock.now())?;

        let mut progress = self.progress.load().await;
        progress.apply_session(&session);
        self.progress.save(&progress).await;

        let mut history = self.history().await;
        history.insert(0, session.clone());
        history.truncate(HISTORY_LIMIT);
        write_json(self.kv.as_ref(), SESSIONS_KEY, &history).await;

        tracing::debug!(
            session = %session.id(),
            phase = %session.phase(),
            success,
            rate = session.success_rate(),
            current_phase = %progress.current_phase(),
            "session completed"
        );
        Ok((session, progress))
    }

    /// Finished sessions, most recent first.
    ///
    /// Unreadable history reads as empty; entries that fail to decode are
    /// skipped individually.
    pub async fn history(&self) -> Vec<Session> {
        read_json_list(self.kv.as_ref(), SESSIONS_KEY).await
    }
}
