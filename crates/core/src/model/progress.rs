use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::phase::{PhaseId, PhaseStatus};
use crate::model::session::Session;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("invalid phase in progress record: {0}")]
    InvalidPhase(u8),

    #[error("phase {0} listed more than once as completed")]
    DuplicateCompletedPhase(u8),

    #[error("success rate must be a finite value in [0, 100], got {0}")]
    InvalidSuccessRate(f64),
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// JSON shape of the `progress` record.
///
/// Kept separate from `UserProgress` so every rehydration goes through
/// `UserProgress::from_persisted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub current_phase: u8,
    pub phases_completed: Vec<u8>,
    pub total_sessions: u32,
    pub success_rate: f64,
    pub last_activity: DateTime<Utc>,
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Durable cross-session summary: which phases are unlocked or mastered and
/// how well the learner has done overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProgressRecord", into = "ProgressRecord")]
pub struct UserProgress {
    user_id: UserId,
    current_phase: PhaseId,
    phases_completed: Vec<PhaseId>,
    total_sessions: u32,
    success_rate: f64,
    last_activity: DateTime<Utc>,
}

impl UserProgress {
    /// Fresh progress: phase 1 unlocked, nothing completed, zero counters.
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_phase: PhaseId::FIRST,
            phases_completed: Vec::new(),
            total_sessions: 0,
            success_rate: 0.0,
            last_activity: now,
        }
    }

    /// Rehydrate progress from its persisted shape.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a phase is out of range, a completed phase is
    /// repeated, or the success rate is not a finite percentage.
    pub fn from_persisted(record: ProgressRecord) -> Result<Self, ProgressError> {
        let current_phase = PhaseId::new(record.current_phase)
            .map_err(|_| ProgressError::InvalidPhase(record.current_phase))?;

        let mut phases_completed = Vec::with_capacity(record.phases_completed.len());
        for raw in record.phases_completed {
            let phase = PhaseId::new(raw).map_err(|_| ProgressError::InvalidPhase(raw))?;
            if phases_completed.contains(&phase) {
                return Err(ProgressError::DuplicateCompletedPhase(raw));
            }
            phases_completed.push(phase);
        }

        if !record.success_rate.is_finite() || !(0.0..=100.0).contains(&record.success_rate) {
            return Err(ProgressError::InvalidSuccessRate(record.success_rate));
        }

        Ok(Self {
            user_id: record.user_id,
            current_phase,
            phases_completed,
            total_sessions: record.total_sessions,
            success_rate: record.success_rate,
            last_activity: record.last_activity,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn current_phase(&self) -> PhaseId {
        self.current_phase
    }

    /// Completed phases in the order they were first mastered.
    #[must_use]
    pub fn phases_completed(&self) -> &[PhaseId] {
        &self.phases_completed
    }

    #[must_use]
    pub fn total_sessions(&self) -> u32 {
        self.total_sessions
    }

    /// Running mean of per-session success rates, in percent.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub fn is_completed(&self, phase: PhaseId) -> bool {
        self.phases_completed.contains(&phase)
    }

    #[must_use]
    pub fn status_of(&self, phase: PhaseId) -> PhaseStatus {
        if self.is_completed(phase) {
            PhaseStatus::Completed
        } else if phase == self.current_phase {
            PhaseStatus::Current
        } else if phase < self.current_phase {
            PhaseStatus::Available
        } else {
            PhaseStatus::Locked
        }
    }

    /// Folds one session's success rate into the running mean and bumps the
    /// session counter.
    pub fn record_session_rate(&mut self, session_rate: f64, now: DateTime<Utc>) {
        let n = f64::from(self.total_sessions);
        let rate = session_rate.clamp(0.0, 100.0);
        self.success_rate = (self.success_rate * n + rate) / (n + 1.0);
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.last_activity = now;
    }

    /// Marks `phase` as mastered.
    ///
    /// Unlocks the next phase only when `phase` is the current one, so replays
    /// of earlier phases never move `current_phase`. Past the last phase the
    /// current phase stays at 6.
    pub fn mark_phase_completed(&mut self, phase: PhaseId) {
        if !self.phases_completed.contains(&phase) {
            self.phases_completed.push(phase);
        }
        if self.current_phase == phase {
            if let Some(next) = phase.next() {
                self.current_phase = next;
            }
        }
    }

    /// Folds a session's rate, then unlocks its phase if it succeeded.
    ///
    /// Activity is stamped with the session's end time (its start time while
    /// still open).
    pub fn apply_session(&mut self, session: &Session) {
        let at = session.ended_at().unwrap_or_else(|| session.started_at());
        self.record_session_rate(session.success_rate(), at);
        if session.success() {
            self.mark_phase_completed(session.phase());
        }
    }
}

impl TryFrom<ProgressRecord> for UserProgress {
    type Error = ProgressError;

    fn try_from(record: ProgressRecord) -> Result<Self, Self::Error> {
        Self::from_persisted(record)
    }
}

impl From<UserProgress> for ProgressRecord {
    fn from(progress: UserProgress) -> Self {
        Self {
            user_id: progress.user_id,
            current_phase: progress.current_phase.value(),
            phases_completed: progress
                .phases_completed
                .into_iter()
                .map(PhaseId::value)
                .collect(),
            total_sessions: progress.total_sessions,
            success_rate: progress.success_rate,
            last_activity: progress.last_activity,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn phase(n: u8) -> PhaseId {
        PhaseId::new(n).unwrap()
    }

    fn fresh() -> UserProgress {
        UserProgress::new(UserId::default_user(), fixed_now())
    }

    #[test]
    fn defaults_start_at_phase_one() {
        let progress = fresh();
        assert_eq!(progress.current_phase(), PhaseId::FIRST);
        assert!(progress.phases_completed().is_empty());
        assert_eq!(progress.total_sessions(), 0);
        assert_eq!(progress.success_rate(), 0.0);
    }

    #[test]
    fn folding_yields_arithmetic_mean() {
        let mut progress = fresh();
        let rates = [100.0, 50.0, 0.0, 25.0, 80.0];
        for rate in rates {
            progress.record_session_rate(rate, fixed_now());
        }
        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        assert!((progress.success_rate() - mean).abs() < 1e-9);
        assert_eq!(progress.total_sessions(), 5);
    }

    #[test]
    fn completing_current_phase_unlocks_next() {
        let mut progress = fresh();
        progress.mark_phase_completed(phase(1));
        assert_eq!(progress.current_phase(), phase(2));
        assert_eq!(progress.phases_completed(), &[phase(1)]);
    }

    #[test]
    fn replaying_completed_phase_keeps_current() {
        let mut progress = fresh();
        progress.mark_phase_completed(phase(1));
        progress.mark_phase_completed(phase(2));
        progress.mark_phase_completed(phase(1));
        assert_eq!(progress.current_phase(), phase(3));
        assert_eq!(progress.phases_completed(), &[phase(1), phase(2)]);
    }

    #[test]
    fn completing_last_phase_saturates() {
        let mut progress = fresh();
        for p in PhaseId::all() {
            progress.mark_phase_completed(p);
        }
        assert_eq!(progress.current_phase(), PhaseId::LAST);
        assert_eq!(progress.phases_completed().len(), 6);
    }

    #[test]
    fn status_query_matches_unlock_rule() {
        let record = ProgressRecord {
            user_id: UserId::default_user(),
            current_phase: 3,
            phases_completed: vec![1, 2],
            total_sessions: 2,
            success_rate: 90.0,
            last_activity: fixed_now(),
        };
        let progress = UserProgress::from_persisted(record).unwrap();
        assert_eq!(progress.status_of(phase(1)), PhaseStatus::Completed);
        assert_eq!(progress.status_of(phase(2)), PhaseStatus::Completed);
        assert_eq!(progress.status_of(phase(3)), PhaseStatus::Current);
        assert_eq!(progress.status_of(phase(4)), PhaseStatus::Locked);
    }

    #[test]
    fn from_persisted_rejects_duplicates_and_bad_rates() {
        let mut record = ProgressRecord::from(fresh());
        record.phases_completed = vec![1, 1];
        assert_eq!(
            UserProgress::from_persisted(record.clone()),
            Err(ProgressError::DuplicateCompletedPhase(1))
        );

        record.phases_completed = vec![];
        record.success_rate = 140.0;
        assert!(matches!(
            UserProgress::from_persisted(record.clone()),
            Err(ProgressError::InvalidSuccessRate(_))
        ));

        record.success_rate = 10.0;
        record.current_phase = 0;
        assert_eq!(
            UserProgress::from_persisted(record),
            Err(ProgressError::InvalidPhase(0))
        );
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let mut progress = fresh();
        progress.mark_phase_completed(phase(1));
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["userId"], "user1");
        assert_eq!(json["currentPhase"], 2);
        assert_eq!(json["phasesCompleted"], serde_json::json!([1]));
        assert_eq!(json["totalSessions"], 0);
        assert!(json["lastActivity"].is_string());

        let back: UserProgress = serde_json::from_value(json).unwrap();
        assert_eq!(back, progress);
    }

    #[test]
    fn applying_a_session_folds_then_unlocks() {
        use crate::model::{Action, ActionDraft, ActionId, ActionKind, SessionId};
        use chrono::Duration;

        let mut progress = fresh();
        let mut session = Session::begin(
            SessionId::generate(),
            UserId::default_user(),
            phase(1),
            fixed_now(),
        );
        for correct in [true, true, true] {
            let draft = ActionDraft::new(ActionKind::ImageExchange, correct, Duration::zero());
            session
                .push_action(Action::new(ActionId::generate(), draft, fixed_now()))
                .unwrap();
        }
        let ended = fixed_now() + Duration::minutes(2);
        session.close(true, ended).unwrap();

        progress.apply_session(&session);

        assert_eq!(progress.success_rate(), 100.0);
        assert_eq!(progress.total_sessions(), 1);
        assert_eq!(progress.current_phase(), phase(2));
        assert_eq!(progress.last_activity(), ended);
    }
}
