use std::sync::Arc;

use pecs_core::model::{Catalog, PhaseId, PracticeSettings, Session, UserProgress};

use crate::Clock;
use crate::error::{PracticeError, SessionError};
use crate::exercise::{AdvanceTicket, Answer, ExerciseConfig, ExerciseEngine, Feedback, Tick};
use crate::progress_store::ProgressStore;
use crate::sessions::SessionRecorder;

/// A phase being practised: the exercise on screen and its open session.
pub struct PracticeSession {
    engine: ExerciseEngine,
    session: Option<Session>,
}

impl PracticeSession {
    #[must_use]
    pub fn engine(&self) -> &ExerciseEngine {
        &self.engine
    }

    /// The open session, `None` once it has been completed.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> PhaseId {
        self.engine.config().phase
    }

    fn take_session(&mut self) -> Result<Session, SessionError> {
        self.session.take().ok_or(SessionError::AlreadyCompleted)
    }
}

/// How a practice session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeOutcome {
    pub session: Session,
    pub progress: UserProgress,
    pub mastered: bool,
}

/// What the caller should do after a timer fired.
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeTick {
    /// Nothing happened; the ticket was out of date.
    Stale,
    /// Wait for the ticket's delay, then tick again.
    Waiting(AdvanceTicket),
    /// A round is ready for an answer.
    NextRound,
    /// The phase was mastered and the session saved.
    Completed(PracticeOutcome),
}

/// Ties an exercise to a recorded session so every answer counts both towards
/// local mastery and the learner's overall success rate.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    catalog: Arc<Catalog>,
    settings: PracticeSettings,
    recorder: SessionRecorder,
    seed: Option<u64>,
}

impl PracticeService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<Catalog>,
        settings: PracticeSettings,
        recorder: SessionRecorder,
    ) -> Self {
        Self {
            clock,
            catalog,
            settings,
            recorder,
            seed: None,
        }
    }

    /// Use reproducible rounds.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &PracticeSettings {
        &self.settings
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        self.recorder.progress()
    }

    /// Open `phase` for practice.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::PhaseLocked` if the phase is not unlocked yet,
    /// or `PracticeError::Exercise` if no round can be built.
    pub async fn start(&self, phase: PhaseId) -> Result<PracticeSession, PracticeError> {
        let status = self.progress().phase_status(phase).await;
        if !status.is_playable() {
            return Err(PracticeError::PhaseLocked(phase));
        }

        let config = ExerciseConfig::for_phase(phase, &self.settings);
        let catalog = Arc::clone(&self.catalog);
        let now = self.clock.now();
        let engine = match self.seed {
            Some(seed) => ExerciseEngine::with_seed(config, catalog, seed, now)?,
            None => ExerciseEngine::new(config, catalog, now)?,
        };

        Ok(PracticeSession {
            engine,
            session: Some(self.recorder.begin(phase)),
        })
    }

    /// Judge an answer and log it as an action.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Exercise` if the exercise cannot take an answer
    /// now, or `PracticeError::Session` if the session was already completed.
    pub fn submit(
        &self,
        practice: &mut PracticeSession,
        answer: &Answer,
    ) -> Result<Feedback, PracticeError> {
        let Some(session) = practice.session.as_mut() else {
            return Err(SessionError::AlreadyCompleted.into());
        };
        let feedback = practice.engine.submit(answer, self.clock.now())?;
        self.recorder.record(session, feedback.action_draft())?;
        Ok(feedback)
    }

    /// Forward a fired timer. Reaching mastery completes the session.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Session` if the session was already completed.
    pub async fn tick(
        &self,
        practice: &mut PracticeSession,
        ticket: AdvanceTicket,
    ) -> Result<PracticeTick, PracticeError> {
        match practice.engine.tick(ticket, self.clock.now()) {
            Tick::Stale => Ok(PracticeTick::Stale),
            Tick::Advancing(next) => Ok(PracticeTick::Waiting(next)),
            Tick::Presenting => Ok(PracticeTick::NextRound),
            Tick::Completed => {
                let session = practice.take_session()?;
                let (session, progress) = self.recorder.complete(session, true).await?;
                Ok(PracticeTick::Completed(PracticeOutcome {
                    session,
                    progress,
                    mastered: true,
                }))
            }
        }
    }

    /// Leave the exercise early. The session succeeds only if the phase was
    /// already mastered.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Session` if the session was already completed.
    pub async fn finish(
        &self,
        practice: &mut PracticeSession,
    ) -> Result<PracticeOutcome, PracticeError> {
        let session = practice.take_session()?;
        practice.engine.close();
        let mastered = practice.engine.mastered();
        let (session, progress) = self.recorder.complete(session, mastered).await?;
        Ok(PracticeOutcome {
            session,
            progress,
            mastered,
        })
    }
}
