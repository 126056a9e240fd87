use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::ids::{ActionId, ImageId, SessionId, UserId};
use crate::model::phase::PhaseId;
use crate::time::non_negative;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    AlreadyCompleted,

    #[error("too many actions for a single session: {len}")]
    TooManyActions { len: usize },
}

//
// ─── ACTION ────────────────────────────────────────────────────────────────────
//

/// What kind of interaction an action records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Picking one picture out of several.
    ImageSelect,
    /// Handing a picture to the communication partner.
    ImageExchange,
    /// Assembling a sentence strip.
    PhraseBuild,
    /// Answering a prompt with a sentence strip.
    QuestionAnswer,
}

/// Caller-supplied part of an action; id and timestamp are assigned on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDraft {
    pub kind: ActionKind,
    pub image_id: Option<ImageId>,
    pub correct: bool,
    pub response_time: Duration,
}

impl ActionDraft {
    #[must_use]
    pub fn new(kind: ActionKind, correct: bool, response_time: Duration) -> Self {
        Self {
            kind,
            image_id: None,
            correct,
            response_time,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image_id: ImageId) -> Self {
        self.image_id = Some(image_id);
        self
    }
}

/// A single timestamped attempt. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    id: ActionId,
    #[serde(rename = "type")]
    kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_id: Option<ImageId>,
    timestamp: DateTime<Utc>,
    correct: bool,
    /// Milliseconds from the prompt appearing to the answer being submitted.
    #[serde(rename = "responseTime", deserialize_with = "clamped_millis")]
    response_time_ms: i64,
}

/// Reads any JSON number, rounding fractions and flooring negatives at zero.
#[allow(clippy::cast_possible_truncation)]
fn clamped_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if raw.is_finite() && raw > 0.0 {
        Ok(raw.round() as i64)
    } else {
        Ok(0)
    }
}

impl Action {
    #[must_use]
    pub fn new(id: ActionId, draft: ActionDraft, timestamp: DateTime<Utc>) -> Self {
        let response_time_ms = non_negative(draft.response_time).num_milliseconds();
        Self {
            id,
            kind: draft.kind,
            image_id: draft.image_id,
            timestamp,
            correct: draft.correct,
            response_time_ms,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    #[must_use]
    pub fn image_id(&self) -> Option<&ImageId> {
        self.image_id.as_ref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn correct(&self) -> bool {
        self.correct
    }

    #[must_use]
    pub fn response_time(&self) -> Duration {
        Duration::milliseconds(self.response_time_ms)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Per-session counts as shown next to an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub correct: u32,
    pub total: u32,
    /// Rounded percentage, 0 when nothing was attempted.
    pub success_rate: u32,
}

/// One practice visit to a phase: opened on entry, closed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    phase: PhaseId,
    #[serde(rename = "startTime")]
    started_at: DateTime<Utc>,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    actions: Vec<Action>,
    success: bool,
}

impl Session {
    #[must_use]
    pub fn begin(
        id: SessionId,
        user_id: UserId,
        phase: PhaseId,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            phase,
            started_at,
            ended_at: None,
            actions: Vec::new(),
            success: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn phase(&self) -> PhaseId {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Only meaningful once the session is complete.
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Append an action to the log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` if the session was closed.
    pub fn push_action(&mut self, action: Action) -> Result<&Action, SessionError> {
        if self.is_complete() {
            return Err(SessionError::AlreadyCompleted);
        }
        self.actions.push(action);
        let last = self.actions.len() - 1;
        Ok(&self.actions[last])
    }

    /// Close the session. The end time never precedes the start time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` on a second call.
    pub fn close(&mut self, success: bool, ended_at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::AlreadyCompleted);
        }
        self.ended_at = Some(ended_at.max(self.started_at));
        self.success = success;
        Ok(())
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.actions.iter().filter(|a| a.correct()).count()
    }

    /// Unrounded `100 * correct / total`, 0 for an empty log.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        success_rate(self.correct_count(), self.actions.len())
    }

    /// Counts for display.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TooManyActions` if the log length cannot fit in `u32`.
    pub fn stats(&self) -> Result<SessionStats, SessionError> {
        let len = self.actions.len();
        let total = u32::try_from(len).map_err(|_| SessionError::TooManyActions { len })?;
        let correct =
            u32::try_from(self.correct_count()).map_err(|_| SessionError::TooManyActions { len })?;
        Ok(SessionStats {
            correct,
            total,
            success_rate: rounded_percent(correct, total),
        })
    }
}

/// `100 * correct / total`, or 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn success_rate(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Whole-number percentage, 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rounded_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn open_session() -> Session {
        Session::begin(
            SessionId::generate(),
            UserId::default_user(),
            PhaseId::FIRST,
            fixed_now(),
        )
    }

    fn action(correct: bool) -> Action {
        let draft = ActionDraft::new(ActionKind::ImageExchange, correct, Duration::milliseconds(800))
            .with_image(ImageId::new("toy_ball"));
        Action::new(ActionId::generate(), draft, fixed_now())
    }

    #[test]
    fn empty_session_rate_is_zero() {
        let session = open_session();
        assert_eq!(session.success_rate(), 0.0);
        let stats = session.stats().unwrap();
        assert_eq!(stats, SessionStats { correct: 0, total: 0, success_rate: 0 });
    }

    #[test]
    fn stats_round_the_percentage() {
        let mut session = open_session();
        session.push_action(action(true)).unwrap();
        session.push_action(action(true)).unwrap();
        session.push_action(action(false)).unwrap();
        let stats = session.stats().unwrap();
        assert_eq!(stats.correct, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.success_rate, 67);
        assert!((session.success_rate() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn closed_session_rejects_actions_and_second_close() {
        let mut session = open_session();
        session.close(true, fixed_now()).unwrap();
        assert_eq!(session.push_action(action(true)).unwrap_err(), SessionError::AlreadyCompleted);
        assert_eq!(session.close(false, fixed_now()).unwrap_err(), SessionError::AlreadyCompleted);
        assert!(session.success());
    }

    #[test]
    fn end_time_never_precedes_start() {
        let mut session = open_session();
        session.close(false, fixed_now() - Duration::seconds(5)).unwrap();
        assert_eq!(session.ended_at(), Some(fixed_now()));
    }

    #[test]
    fn negative_response_time_is_stored_as_zero() {
        let draft = ActionDraft::new(ActionKind::PhraseBuild, false, Duration::milliseconds(-250));
        let action = Action::new(ActionId::generate(), draft, fixed_now());
        assert_eq!(action.response_time(), Duration::zero());
    }

    #[test]
    fn json_layout_matches_history_format() {
        let mut session = open_session();
        session.push_action(action(true)).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("endTime").is_none());
        assert_eq!(json["phase"], 1);
        assert_eq!(json["userId"], "user1");
        assert!(json["startTime"].is_string());
        let first = &json["actions"][0];
        assert_eq!(first["type"], "image_exchange");
        assert_eq!(first["imageId"], "toy_ball");
        assert_eq!(first["responseTime"], 800);

        session.close(true, fixed_now()).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json["endTime"].is_string());
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn stored_actions_with_odd_timings_still_load() {
        let raw = r#"{
            "id": "lq2x9a7f",
            "userId": "user1",
            "phase": 2,
            "startTime": "2023-11-14T22:13:20Z",
            "endTime": "2023-11-14T22:14:00Z",
            "actions": [
                {"id": "a1", "type": "image_exchange", "imageId": "food_apple",
                 "timestamp": "2023-11-14T22:13:30Z", "correct": true, "responseTime": -812},
                {"id": "a2", "type": "image_exchange",
                 "timestamp": "2023-11-14T22:13:40Z", "correct": false, "responseTime": 1250.6}
            ],
            "success": false
        }"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.id().as_str(), "lq2x9a7f");
        assert_eq!(session.actions()[0].id().as_str(), "a1");
        assert_eq!(session.actions()[0].response_time(), Duration::zero());
        assert_eq!(session.actions()[1].response_time(), Duration::milliseconds(1251));
    }
}
